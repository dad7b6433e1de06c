//! Orchestration: config, input, backend call, safety check, output.
//!
//! Each subcommand returns an exit code or an [`AppError`]; [`run`] turns
//! both into the process exit status.

use std::fs;
use std::io::{self, Write};
use std::time::Duration;

use qc_backend::{Backend, BackendError, BackendKind, BackendSettings};
use qc_protocol::CommandRequest;
use qc_safety::{Checker, Classification, Severity};

use crate::cli::{Cli, Command, ConfigAction};
use crate::config::{self, mask_api_key, Config};
use crate::editor::{process_input, resolve_editor_path, Editor};
use crate::error::{AppError, EXIT_DANGER_BLOCKED, EXIT_SUCCESS, MAX_QUERY_LENGTH};
use crate::output::{OutputError, OutputMode, Router, SystemClipboard};
use crate::sanitize::{check_error_sentinel, sanitize};
use crate::shellctx;
use crate::style::{Color, Style};

/// Effective settings for one generation, after flags override config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend: BackendKind,
    pub model: String,
    pub output_mode: OutputMode,
    pub timeout: Duration,
    pub include_context: bool,
    /// False with `--no-safety`.
    pub check_safety: bool,
    pub block_dangerous: bool,
    pub show_warnings: bool,
    pub verbose: bool,
}

impl Settings {
    /// Flags win over config. An explicit but invalid `--backend` or
    /// `--output` is a user error; an absent one falls back to config.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self, AppError> {
        let backend_name = cli.backend_name().unwrap_or(config.backend.as_str());
        let backend: BackendKind = backend_name.parse()?;

        let model = cli
            .model_name()
            .map(str::to_string)
            .unwrap_or_else(|| config.model(backend).to_string());

        let output_mode = match cli.output_mode() {
            Some(mode) => mode
                .parse()
                .map_err(|_| AppError::InvalidOutputMode(mode.to_string()))?,
            None => config.output_mode.parse()?,
        };

        Ok(Self {
            backend,
            model,
            output_mode,
            timeout: config.timeout(),
            include_context: config.include_context,
            check_safety: !cli.no_safety,
            block_dangerous: config.safety.block_dangerous,
            show_warnings: config.safety.show_warnings,
            verbose: cli.verbose,
        })
    }
}

/// What a successful generation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub command: String,
    /// `None` when safety checks were disabled.
    pub classification: Option<Classification>,
    /// Danger verdict with blocking enabled.
    pub dangerous: bool,
    pub tokens_used: u32,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        if self.dangerous {
            EXIT_DANGER_BLOCKED
        } else {
            EXIT_SUCCESS
        }
    }
}

// --- Input ---

/// Reject empty, NUL-containing, or oversized queries.
pub fn validate_input(query: &str) -> Result<(), AppError> {
    if query.trim().is_empty() {
        return Err(AppError::EmptyQuery);
    }
    if query.contains('\0') {
        return Err(AppError::NulBytes);
    }
    if query.len() > MAX_QUERY_LENGTH {
        return Err(AppError::QueryTooLong);
    }
    Ok(())
}

/// Query from `--query-file`, then `--query`, then the interactive editor.
pub fn read_query(cli: &Cli, config: &Config) -> Result<String, AppError> {
    if let Some(path) = &cli.query_file {
        let content = fs::read_to_string(path).map_err(|source| AppError::QueryFile {
            path: path.clone(),
            source,
        })?;
        return Ok(process_input(&content));
    }
    if let Some(query) = cli.query_text() {
        return Ok(query.to_string());
    }
    Ok(Editor::new(config.editor.editor.as_str()).read_input()?)
}

// --- Generation ---

/// Ask the backend for a command, clean it up, classify it and route it.
///
/// Banners and verbose notes go to the router's stderr; the command itself
/// goes wherever `settings.output_mode` says.
pub async fn generate(
    backend: &dyn Backend,
    settings: &Settings,
    query: &str,
    router: &mut Router<'_>,
) -> Result<Outcome, AppError> {
    let style = router.style();

    let mut request = CommandRequest::new(query).with_model(settings.model.as_str());
    if settings.include_context {
        request = request.with_context(shellctx::gather());
    }

    if settings.verbose {
        let note = format!(
            "qcmd: using backend={} model={}",
            settings.backend, settings.model
        );
        writeln!(router.stderr(), "{}", style.dim(&note)).map_err(OutputError::Io)?;
    }

    let response = tokio::time::timeout(settings.timeout, backend.generate_command(&request))
        .await
        .map_err(|_| AppError::Timeout)?
        .map_err(|err| match err {
            BackendError::NoApiKey => AppError::NoApiKey {
                backend: settings.backend,
            },
            other => AppError::from(other),
        })?;

    let command = sanitize(&response.command);
    if let Some(message) = check_error_sentinel(&command) {
        return Err(AppError::LlmRefused(message));
    }
    if command.is_empty() {
        return Err(BackendError::EmptyResponse.into());
    }

    tracing::debug!(tokens = response.tokens_used, "generation complete");
    if settings.verbose {
        let note = format!("qcmd: tokens used: {}", response.tokens_used);
        writeln!(router.stderr(), "{}", style.dim(&note)).map_err(OutputError::Io)?;
    }

    let mut dangerous = false;
    let classification = if settings.check_safety {
        let verdict = Checker::new().check(&command);
        tracing::debug!(
            severity = verdict.severity.as_str(),
            category = verdict.category_str(),
            "classified command"
        );

        match verdict.severity {
            Severity::Danger if settings.block_dangerous => {
                dangerous = true;
                write_banner(router.stderr(), style, &verdict).map_err(OutputError::Io)?;
            }
            Severity::Caution if settings.show_warnings => {
                write_banner(router.stderr(), style, &verdict).map_err(OutputError::Io)?;
            }
            _ => {}
        }
        Some(verdict)
    } else {
        None
    };

    router.emit(&command, settings.output_mode, dangerous)?;

    Ok(Outcome {
        command,
        classification,
        dangerous,
        tokens_used: response.tokens_used,
    })
}

/// Danger or caution banner with category and reason.
pub fn write_banner(w: &mut dyn Write, style: Style, verdict: &Classification) -> io::Result<()> {
    let header = match verdict.severity {
        Severity::Danger => style.paint(Color::Red, "WARNING: Dangerous command detected!"),
        Severity::Caution => style.paint(
            Color::Yellow,
            "Caution: Review this command before executing.",
        ),
        Severity::Safe => return Ok(()),
    };
    writeln!(w)?;
    writeln!(w, "{header}")?;
    writeln!(w, "  Category: {}", verdict.category_str())?;
    writeln!(w, "  Reason: {}", verdict.description)?;
    writeln!(w)
}

// --- Subcommands ---

/// `qcmd config`: effective configuration with API keys masked.
pub fn show_config(
    w: &mut dyn Write,
    config: &Config,
    source: Option<&std::path::Path>,
) -> io::Result<()> {
    writeln!(w, "Current configuration:")?;
    writeln!(w)?;
    match source {
        Some(path) => writeln!(w, "  Config File:     {}", path.display())?,
        None => writeln!(w, "  Config File:     (defaults)")?,
    }
    writeln!(w, "  Backend:         {}", config.backend)?;
    writeln!(w, "  Include Context: {}", config.include_context)?;
    writeln!(w, "  Output Mode:     {}", config.output_mode)?;

    for kind in BackendKind::ALL {
        writeln!(w)?;
        writeln!(w, "  [{kind}]")?;
        writeln!(w, "    Model:         {}", config.model(kind))?;
        writeln!(w, "    API Key:       {}", mask_api_key(config.api_key(kind)))?;
    }

    writeln!(w)?;
    writeln!(w, "  [safety]")?;
    writeln!(w, "    Block Danger:  {}", config.safety.block_dangerous)?;
    writeln!(w, "    Show Warnings: {}", config.safety.show_warnings)?;
    writeln!(w)?;
    writeln!(w, "  [editor]")?;
    let editor = resolve_editor_path(&config.editor.editor);
    writeln!(w, "    Editor:        {}", editor.display())?;
    writeln!(w)?;
    writeln!(w, "  [advanced]")?;
    writeln!(w, "    Timeout:       {}s", config.advanced.timeout_seconds)?;
    writeln!(w, "    Max Tokens:    {}", config.advanced.max_tokens)
}

/// `qcmd backends`: every provider with its key status and model.
pub fn list_backends(w: &mut dyn Write, config: &Config) -> io::Result<()> {
    writeln!(w, "Available backends:")?;
    for kind in BackendKind::ALL {
        writeln!(w)?;
        let active = if config.backend == kind.as_str() {
            " (active)"
        } else {
            ""
        };
        let status = if config.api_key(kind).is_empty() {
            "not configured"
        } else {
            "configured"
        };
        writeln!(w, "  {kind}{active}")?;
        writeln!(w, "    Status: {status}")?;
        writeln!(w, "    Model:  {}", config.model(kind))?;
    }
    Ok(())
}

/// `qcmd check`: classify without a backend. Exit 3 on a danger verdict.
pub fn check_command(w: &mut dyn Write, command: &str) -> io::Result<i32> {
    let verdict = Checker::new().check(command);
    writeln!(w, "Severity: {}", verdict.severity.label())?;
    if !verdict.is_safe() {
        writeln!(w, "Category: {}", verdict.category_str())?;
        writeln!(w, "Reason:   {}", verdict.description)?;
        writeln!(w, "Pattern:  {}", verdict.pattern)?;
    }
    Ok(if verdict.is_danger() {
        EXIT_DANGER_BLOCKED
    } else {
        EXIT_SUCCESS
    })
}

// --- Entry point ---

/// Run the parsed command line and return the process exit code.
pub fn run(cli: Cli) -> i32 {
    match dispatch(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("qcmd: {err}");
            err.exit_code()
        }
    }
}

fn dispatch(cli: &Cli) -> Result<i32, AppError> {
    match &cli.command {
        Some(Command::Config {
            action: Some(ConfigAction::Init),
        }) => {
            let path = config::init_default_config()?;
            let style = Style::for_stderr();
            let created = format!("Created config file: {}", path.display());
            eprintln!("{}", style.paint(Color::Green, &created));
            Ok(EXIT_SUCCESS)
        }
        Some(Command::Config { action: None }) => {
            let (config, source) = Config::load(cli.config.as_deref())?;
            show_config(&mut io::stderr().lock(), &config, source.as_deref())
                .map_err(OutputError::Io)?;
            Ok(EXIT_SUCCESS)
        }
        Some(Command::Backends) => {
            let (config, _) = Config::load(cli.config.as_deref())?;
            list_backends(&mut io::stderr().lock(), &config).map_err(OutputError::Io)?;
            Ok(EXIT_SUCCESS)
        }
        Some(Command::Check { command }) => {
            let code = check_command(&mut io::stdout().lock(), &command.join(" "))
                .map_err(OutputError::Io)?;
            Ok(code)
        }
        None => run_generate(cli),
    }
}

fn run_generate(cli: &Cli) -> Result<i32, AppError> {
    let (config, source) = Config::load(cli.config.as_deref())?;
    if let Some(path) = &source {
        tracing::debug!(path = %path.display(), "loaded config");
    }
    config.validate()?;

    let settings = Settings::resolve(cli, &config)?;
    let query = read_query(cli, &config)?;
    validate_input(&query)?;

    if cli.verbose && cli.query_file.is_some() && cli.query_text().is_some() {
        eprintln!("qcmd: warning: --query-file takes precedence over --query");
    }

    let backend = qc_backend::build(
        settings.backend,
        BackendSettings {
            api_key: config.api_key(settings.backend).to_string(),
            model: settings.model.clone(),
            max_tokens: config.max_tokens(),
            timeout: settings.timeout,
        },
    )?;

    let runtime = tokio::runtime::Runtime::new().map_err(AppError::Runtime)?;

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let clipboard = SystemClipboard;
    let mut router =
        Router::new(&mut stdout, &mut stderr, &clipboard).with_style(Style::for_stderr());

    let outcome = runtime.block_on(generate(backend.as_ref(), &settings, &query, &mut router))?;
    Ok(outcome.exit_code())
}
