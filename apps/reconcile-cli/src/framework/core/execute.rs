//! # Reconciliation Execution Module
//!
//! Runs a [`ReconciliationPlan`] against the server and turns it into the outcome
//! reported back to the caller. Statements run strictly in order; the first failure
//! stops the run and earlier statements stay applied.
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::plan::{plan_changes, validate_descriptor, ReconciliationPlan};
use super::query::{run_raw_query, RawQuery};
use crate::framework::core::infrastructure::{ResourceDescriptor, ResourceKind};
use crate::infrastructure::olap::clickhouse::errors::{
    validate_clickhouse_identifier, ClickhouseError,
};
use crate::infrastructure::olap::{SqlClientError, SqlExecutor};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The server could not be reached or refused the session. Nothing was mutated.
    #[error("Failed to connect to ClickHouse at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: SqlClientError,
    },

    /// A statement failed server-side. `statement` has its secrets masked.
    #[error("{source}: Error on query: {statement}")]
    Query {
        statement: String,
        #[source]
        source: SqlClientError,
    },

    /// Invalid or contradicting parameters, raised before any statement is sent.
    #[error(transparent)]
    Configuration(#[from] ClickhouseError),
}

impl ReconcileError {
    /// Statement text to report along with the failure, if any.
    pub fn statement(&self) -> Option<&str> {
        match self {
            ReconcileError::Query { statement, .. } => Some(statement),
            _ => None,
        }
    }
}

/// Result record of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReconciliationOutcome {
    Applied {
        changed: bool,
        msg: String,
        statements: Vec<String>,
    },
    Existence {
        changed: bool,
        exists: bool,
    },
    Executed {
        changed: bool,
        executed_query: String,
    },
    Rows {
        changed: bool,
        query_result: Vec<Value>,
    },
}

impl ReconciliationOutcome {
    pub fn changed(&self) -> bool {
        match self {
            ReconciliationOutcome::Applied { changed, .. }
            | ReconciliationOutcome::Existence { changed, .. }
            | ReconciliationOutcome::Executed { changed, .. }
            | ReconciliationOutcome::Rows { changed, .. } => *changed,
        }
    }
}

/// What a single invocation asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// Converge a resource to its desired state
    Reconcile(ResourceDescriptor),
    /// Only report whether a named resource exists
    Check { kind: ResourceKind, name: String },
    /// Run a statement as given
    Query(RawQuery),
}

impl Invocation {
    /// Catches parameter mistakes before a connection is opened.
    pub fn validate(&self) -> Result<(), ClickhouseError> {
        match self {
            Invocation::Reconcile(descriptor) => validate_descriptor(descriptor),
            Invocation::Check { kind, name } => {
                if kind.system_table().is_none() {
                    return Err(ClickhouseError::invalid_parameters(format!(
                        "existence check is not available for {}",
                        kind.label().to_lowercase()
                    )));
                }
                validate_clickhouse_identifier(name, &format!("{} name", kind.label().to_lowercase()))
            }
            Invocation::Query(query) => query.validate(),
        }
    }
}

/// Reconciles descriptors through a [`SqlExecutor`].
pub struct Reconciler<'a> {
    executor: &'a dyn SqlExecutor,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(executor: &'a dyn SqlExecutor) -> Self {
        Self {
            executor,
            dry_run: false,
        }
    }

    /// Plans as usual but never sends a mutating statement.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn check_connection(&self, display_url: &str) -> Result<(), ReconcileError> {
        self.executor
            .ping()
            .await
            .map_err(|source| ReconcileError::Connection {
                url: display_url.to_string(),
                source,
            })
    }

    /// Existence check mode: the probe alone, never a mutation.
    pub async fn exists(
        &self,
        kind: ResourceKind,
        name: &str,
    ) -> Result<ReconciliationOutcome, ReconcileError> {
        Invocation::Check {
            kind,
            name: name.to_string(),
        }
        .validate()?;
        let exists = super::plan::probe_exists(self.executor, kind, name).await?;
        info!("{} '{}' exists: {}", kind.label(), name, exists);
        Ok(ReconciliationOutcome::Existence {
            changed: false,
            exists,
        })
    }

    pub async fn plan(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<ReconciliationPlan, ReconcileError> {
        plan_changes(self.executor, descriptor).await
    }

    /// Runs the statements of a plan in order.
    pub async fn apply(
        &self,
        plan: ReconciliationPlan,
    ) -> Result<ReconciliationOutcome, ReconcileError> {
        let statements: Vec<String> = plan.statements.iter().map(|s| s.display.clone()).collect();

        if self.dry_run {
            info!("Dry run, {} statement(s) not executed", statements.len());
            return Ok(ReconciliationOutcome::Applied {
                changed: plan.changes(),
                msg: format!("{} (dry run)", plan.msg),
                statements,
            });
        }

        let total = plan.statements.len();
        for (index, statement) in plan.statements.iter().enumerate() {
            debug!("Running statement: {}", statement.display);
            if let Err(source) = self.executor.command(&statement.sql, &[]).await {
                if index > 0 {
                    warn!(
                        "{} of {} statement(s) for {} were applied before the failure",
                        index,
                        total,
                        plan.kind.label().to_lowercase()
                    );
                }
                return Err(ReconcileError::Query {
                    statement: statement.display.clone(),
                    source,
                });
            }
        }

        info!("{}", plan.msg);
        Ok(ReconciliationOutcome::Applied {
            changed: plan.changes(),
            msg: plan.msg,
            statements,
        })
    }

    pub async fn reconcile(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<ReconciliationOutcome, ReconcileError> {
        let plan = self.plan(descriptor).await?;
        self.apply(plan).await
    }

    pub async fn execute(
        &self,
        invocation: &Invocation,
    ) -> Result<ReconciliationOutcome, ReconcileError> {
        match invocation {
            Invocation::Reconcile(descriptor) => self.reconcile(descriptor).await,
            Invocation::Check { kind, name } => self.exists(*kind, name).await,
            Invocation::Query(query) => run_raw_query(self.executor, query, self.dry_run).await,
        }
    }
}
