pub mod commands;
pub mod logging;
pub mod types;

use std::process::ExitCode;

use clap::Parser;

/// Run the command-line interface
pub fn run() -> ExitCode {
    let cli = types::Cli::parse();

    logging::init_logging(cli.debug, cli.quiet);
    logging::configure_backtrace(cli.trace);

    let result = match &cli.command {
        types::Commands::Generate {
            book,
            config,
            output,
            tags,
        } => commands::handle_generate_command(book, config.as_deref(), output.as_deref(), tags.as_deref()),
        types::Commands::Config { validate, format } => {
            commands::handle_config_command(validate.as_deref(), *format)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
