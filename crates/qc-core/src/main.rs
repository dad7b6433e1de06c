use clap::error::ErrorKind;
use clap::Parser;
use qc_core::error::{EXIT_SUCCESS, EXIT_USER_ERROR};
use qc_core::{app, logging, Cli};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_SUCCESS,
                _ => EXIT_USER_ERROR,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    logging::init(cli.verbose);

    std::process::exit(app::run(cli));
}
