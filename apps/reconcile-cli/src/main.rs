#[macro_use]
mod cli;
pub mod framework;
pub mod infrastructure;
pub mod utilities;

#[cfg(test)]
#[path = "../tests/test_utils.rs"]
pub mod test_utils;

use std::process::ExitCode;

use clap::Parser;
use cli::display::{Message, MessageType};
use cli::routines::RoutineFailure;
use utilities::constants::EXIT_CODE_FAILURE;

// Entry point for the CLI application
fn main() -> ExitCode {
    // Usage errors exit with code 2, like every other configuration error
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let settings = match cli::settings::read_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            let failure = RoutineFailure::configuration(
                Message::new("Settings".to_string(), format!("Failed to read settings: {e}")),
                e,
            );
            failure.show();
            failure.print_record();
            return ExitCode::from(failure.exit_code);
        }
    };

    if let Err(e) = cli::logger::setup_logging(&settings.logger, cli.debug) {
        show_message!(
            MessageType::Error,
            Message::new("Logger".to_string(), e.to_string())
        );
    }

    // One invocation, one connection: a single thread is all it takes
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let failure = RoutineFailure::new(
                Message::new("Runtime".to_string(), format!("Failed to start: {e}")),
                e,
            );
            failure.show();
            failure.print_record();
            return ExitCode::from(EXIT_CODE_FAILURE);
        }
    };

    match runtime.block_on(cli::top_command_handler(settings, cli)) {
        Ok(success) => {
            success.show();
            success.print_record();
            ExitCode::SUCCESS
        }
        Err(failure) => {
            failure.show();
            if let Some(err) = &failure.error {
                tracing::debug!("{err:?}");
            }
            failure.print_record();
            ExitCode::from(failure.exit_code)
        }
    }
}
