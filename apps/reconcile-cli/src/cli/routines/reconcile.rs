use tracing::{debug, info};

use super::{RoutineFailure, RoutineSuccess};
use crate::cli::display::Message;
use crate::cli::settings::Settings;
use crate::framework::core::execute::{Invocation, Reconciler};
use crate::infrastructure::olap::clickhouse::config::{ClickHouseConfig, ConnectionParams};
use crate::infrastructure::olap::clickhouse::create_client;

/// Label shown next to the outcome of an invocation.
pub fn action_label(invocation: &Invocation) -> String {
    match invocation {
        Invocation::Reconcile(descriptor) => descriptor.kind().label().to_string(),
        Invocation::Check { kind, .. } => format!("{} check", kind.label()),
        Invocation::Query(_) => "Query".to_string(),
    }
}

/// Resolves the connection for an invocation: settings, then `overrides`.
///
/// A raw query with a target database connects to that database.
pub fn connection_config(
    settings: &Settings,
    overrides: &ConnectionParams,
    invocation: &Invocation,
) -> anyhow::Result<ClickHouseConfig> {
    let config = settings.connection.merged_with(overrides).resolve()?;
    Ok(match invocation {
        Invocation::Query(query) => match &query.db {
            Some(db) => config.with_database(db),
            None => config,
        },
        _ => config,
    })
}

/// Validates the invocation, connects, and runs it.
///
/// Nothing is sent to the server when the parameters are invalid.
pub async fn run_invocation(
    settings: &Settings,
    overrides: &ConnectionParams,
    invocation: Invocation,
    dry_run: bool,
) -> Result<RoutineSuccess, RoutineFailure> {
    let action = action_label(&invocation);

    invocation.validate().map_err(|e| {
        RoutineFailure::configuration(Message::new(action.clone(), e.to_string()), e)
    })?;

    let config = connection_config(settings, overrides, &invocation).map_err(|e| {
        RoutineFailure::configuration(
            Message::new(action.clone(), format!("Invalid connection parameters: {e}")),
            e,
        )
    })?;
    debug!("Connecting to {}", config.display_url());

    let client = create_client(config);
    let reconciler = Reconciler::new(&client).dry_run(dry_run);

    reconciler
        .check_connection(&client.config.display_url())
        .await
        .map_err(|e| RoutineFailure::from_reconcile_error(&action, e))?;

    let outcome = reconciler
        .execute(&invocation)
        .await
        .map_err(|e| RoutineFailure::from_reconcile_error(&action, e))?;

    info!("{} finished, changed: {}", action, outcome.changed());
    Ok(RoutineSuccess::from_outcome(&action, &outcome))
}
