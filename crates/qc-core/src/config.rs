use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use qc_backend::BackendKind;
use serde::Deserialize;
use thiserror::Error;

use crate::output::OutputMode;

/// Template written by `qcmd config init`. Parses to `Config::default()`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# qcmd configuration file

# Default backend to use: anthropic | openai | openrouter
backend = "anthropic"

# Include shell context (pwd, shell, OS) in prompts
include_context = true

# Output mode preference when run directly (not via shell wrapper)
# "auto" = try clipboard, then print
# "clipboard" = always clipboard
# "print" = always print
output_mode = "auto"

[anthropic]
# API key (or use ANTHROPIC_API_KEY env var)
api_key = ""
model = "claude-haiku-4-5-20251001"

[openai]
# API key (or use OPENAI_API_KEY env var)
api_key = ""
model = "gpt-5o"

[openrouter]
# API key (or use OPENROUTER_API_KEY env var)
api_key = ""
model = "anthropic/claude-haiku-4-5-20251001"

[safety]
# Block dangerous commands from being injected (still prints them)
block_dangerous = true
# Show warnings for cautionary commands
show_warnings = true

[editor]
# Override $VISUAL/$EDITOR
# editor = "nvim"

[advanced]
# API call timeout in seconds
timeout_seconds = 30
# Maximum tokens for LLM response
max_tokens = 512
"#;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid backend: {0} (must be anthropic, openai, or openrouter)")]
    InvalidBackend(String),
    #[error("invalid output_mode: {0} (must be auto, clipboard, print, or zle)")]
    InvalidOutputMode(String),
    #[error("timeout_seconds must be positive")]
    NonPositiveTimeout,
    #[error("max_tokens must be positive")]
    NonPositiveMaxTokens,
    #[error("config file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error("cannot determine config directory: neither XDG_CONFIG_HOME nor HOME is set")]
    NoConfigDir,
    #[error("failed to write config {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

impl ConfigError {
    /// Validation problems are the user's to fix; I/O and parse failures are
    /// environmental.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConfigError::InvalidBackend(_)
                | ConfigError::InvalidOutputMode(_)
                | ConfigError::NonPositiveTimeout
                | ConfigError::NonPositiveMaxTokens
                | ConfigError::AlreadyExists(_)
        )
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub backend: String,
    pub include_context: bool,
    pub output_mode: String,
    pub anthropic: ProviderConfig,
    pub openai: ProviderConfig,
    pub openrouter: ProviderConfig,
    pub safety: SafetyConfig,
    pub editor: EditorConfig,
    pub advanced: AdvancedConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: "anthropic".to_string(),
            include_context: true,
            output_mode: "auto".to_string(),
            anthropic: ProviderConfig::with_model(BackendKind::Anthropic.default_model()),
            openai: ProviderConfig::with_model(BackendKind::OpenAi.default_model()),
            openrouter: ProviderConfig::with_model(BackendKind::OpenRouter.default_model()),
            safety: SafetyConfig::default(),
            editor: EditorConfig::default(),
            advanced: AdvancedConfig::default(),
        }
    }
}

/// Per-provider credentials and model.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: String,
    /// Empty falls back to the provider default.
    pub model: String,
}

impl ProviderConfig {
    fn with_model(model: &str) -> Self {
        Self {
            api_key: String::new(),
            model: model.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SafetyConfig {
    /// Exit with the danger code instead of letting the wrapper inject.
    pub block_dangerous: bool,
    /// Print a banner for Caution commands.
    pub show_warnings: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            block_dangerous: true,
            show_warnings: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Overrides `$VISUAL`/`$EDITOR` when non-empty.
    pub editor: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdvancedConfig {
    pub timeout_seconds: i64,
    pub max_tokens: i64,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_tokens: 512,
        }
    }
}

impl Config {
    /// Load from the resolved config path (if any), then apply environment
    /// overrides. Returns the config and the file it came from.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        Self::load_with_env(explicit, process_env)
    }

    /// Like [`Config::load`] with a custom environment lookup.
    pub fn load_with_env<F>(
        explicit: Option<&Path>,
        env: F,
    ) -> Result<(Self, Option<PathBuf>), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = find_config_path(explicit, &env);
        let mut config = match &path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides(&env);
        Ok((config, path))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        warn_if_insecure(path);
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Environment variables win over file values when set and non-empty.
    pub fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for kind in BackendKind::ALL {
            if let Some(key) = env(kind.api_key_env()) {
                self.provider_mut(kind).api_key = key;
            }
        }
        if let Some(backend) = env("QCMD_BACKEND") {
            self.backend = backend;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.parse::<BackendKind>().is_err() {
            return Err(ConfigError::InvalidBackend(self.backend.clone()));
        }
        if self.output_mode.parse::<OutputMode>().is_err() {
            return Err(ConfigError::InvalidOutputMode(self.output_mode.clone()));
        }
        if self.advanced.timeout_seconds <= 0 {
            return Err(ConfigError::NonPositiveTimeout);
        }
        if self.advanced.max_tokens <= 0 {
            return Err(ConfigError::NonPositiveMaxTokens);
        }
        Ok(())
    }

    pub fn provider(&self, kind: BackendKind) -> &ProviderConfig {
        match kind {
            BackendKind::Anthropic => &self.anthropic,
            BackendKind::OpenAi => &self.openai,
            BackendKind::OpenRouter => &self.openrouter,
        }
    }

    fn provider_mut(&mut self, kind: BackendKind) -> &mut ProviderConfig {
        match kind {
            BackendKind::Anthropic => &mut self.anthropic,
            BackendKind::OpenAi => &mut self.openai,
            BackendKind::OpenRouter => &mut self.openrouter,
        }
    }

    pub fn api_key(&self, kind: BackendKind) -> &str {
        &self.provider(kind).api_key
    }

    /// Configured model, or the provider default when unset.
    pub fn model(&self, kind: BackendKind) -> &str {
        let model = self.provider(kind).model.as_str();
        if model.is_empty() {
            kind.default_model()
        } else {
            model
        }
    }

    /// Request timeout. Only meaningful after `validate()`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.advanced.timeout_seconds.max(0) as u64)
    }

    pub fn max_tokens(&self) -> u32 {
        u32::try_from(self.advanced.max_tokens.max(0)).unwrap_or(u32::MAX)
    }
}

// --- Path resolution ---

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolve the config file: explicit path, `$QCMD_CONFIG`, then the XDG and
/// home locations when the file exists there.
pub fn find_config_path<F>(explicit: Option<&Path>, env: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env("QCMD_CONFIG") {
        return Some(PathBuf::from(path));
    }
    if let Some(xdg) = env("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg).join("qcmd").join("config.toml");
        if path.is_file() {
            return Some(path);
        }
    }
    if let Some(home) = env("HOME") {
        let path = PathBuf::from(home)
            .join(".config")
            .join("qcmd")
            .join("config.toml");
        if path.is_file() {
            return Some(path);
        }
    }
    None
}

/// Directory `config init` writes to.
pub fn config_dir<F>(env: F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(xdg) = env("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("qcmd"));
    }
    env("HOME")
        .map(|home| PathBuf::from(home).join(".config").join("qcmd"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Write the default template as `config.toml` in the config directory.
/// Never overwrites an existing file.
pub fn init_config<F>(env: F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let dir = config_dir(env)?;
    create_private_dir(&dir).map_err(|source| ConfigError::Write {
        path: dir.clone(),
        source,
    })?;

    let path = dir.join("config.toml");
    write_private_file(&path, DEFAULT_CONFIG_TOML).map_err(|source| {
        if source.kind() == io::ErrorKind::AlreadyExists {
            ConfigError::AlreadyExists(path.clone())
        } else {
            ConfigError::Write {
                path: path.clone(),
                source,
            }
        }
    })?;

    Ok(path)
}

/// Convenience wrapper over [`init_config`] using the process environment.
pub fn init_default_config() -> Result<PathBuf, ConfigError> {
    init_config(process_env)
}

// --- Permissions ---

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn write_private_file(path: &Path, contents: &str) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private_file(path: &Path, contents: &str) -> io::Result<()> {
    use std::io::Write;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(unix)]
fn insecure_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path).ok()?.permissions().mode() & 0o777;
    (mode & 0o077 != 0).then_some(mode)
}

#[cfg(not(unix))]
fn insecure_mode(_path: &Path) -> Option<u32> {
    None
}

fn warn_if_insecure(path: &Path) {
    if let Some(mode) = insecure_mode(path) {
        tracing::warn!(
            "config file {} has insecure permissions {mode:o}, should be 600",
            path.display()
        );
    }
}

/// Mask an API key for display: first and last four characters only.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        1..=8 => "****".to_string(),
        n => {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[n - 4..].iter().collect();
            format!("{head}...{tail}")
        }
    }
}
