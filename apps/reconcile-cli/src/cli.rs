#[macro_use]
pub(crate) mod display;

mod commands;
pub mod logger;
pub mod routines;
pub mod settings;

use std::path::{Path, PathBuf};

use clap::Parser;
use commands::{Commands, ConnectionArgs};
use tracing::{debug, info};

use crate::cli::display::Message;
use crate::cli::routines::reconcile::run_invocation;
use crate::cli::routines::{RoutineFailure, RoutineSuccess};
use crate::framework::core::params::ParameterRecord;
use crate::utilities::constants::CLI_VERSION;
use settings::Settings;

#[derive(Parser)]
#[command(author, version = CLI_VERSION, about, long_about = None, arg_required_else_help(true), next_display_order = None)]
pub struct Cli {
    /// Turn debugging information on
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Settings file, ~/.ch-reconcile/config.toml when not set
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Probe and plan, report what would change, but execute no mutating statement
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

fn read_params_file(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(path)
    }
}

pub async fn top_command_handler(settings: Settings, cli: Cli) -> Result<RoutineSuccess, RoutineFailure> {
    let flags = cli.connection.to_params();

    let (invocation, connection, dry_run) = match cli.command {
        Commands::Database(args) => (args.into_invocation(), flags, cli.dry_run),
        Commands::NamedCollection(args) => (args.into_invocation(), flags, cli.dry_run),
        Commands::Role(args) => (args.into_invocation(), flags, cli.dry_run),
        Commands::User(args) => (args.into_invocation(), flags, cli.dry_run),
        Commands::Grant(args) => (args.into_invocation(), flags, cli.dry_run),
        Commands::Query(args) => (args.into_invocation(), flags, cli.dry_run),
        Commands::Apply { params } => {
            info!("Running parameter record {}", params.display());
            let text = read_params_file(&params).map_err(|e| {
                RoutineFailure::configuration(
                    Message::new(
                        "Apply".to_string(),
                        format!("Failed to read {}: {e}", params.display()),
                    ),
                    e,
                )
            })?;
            let record = ParameterRecord::from_json(&text).map_err(|e| {
                RoutineFailure::configuration(Message::new("Apply".to_string(), e.to_string()), e)
            })?;

            // Flags given on the command line win over the record
            let connection = record.connection.merged_with(&flags);
            let dry_run = cli.dry_run || record.check_mode;
            let invocation = record.into_invocation().map_err(|e| {
                RoutineFailure::configuration(Message::new("Apply".to_string(), e.to_string()), e)
            })?;
            (invocation, connection, dry_run)
        }
    };

    debug!("Invocation: {:?}, dry run: {}", invocation, dry_run);
    run_invocation(&settings, &connection, invocation, dry_run).await
}
