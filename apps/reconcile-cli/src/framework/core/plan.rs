//! # Reconciliation Planning Module
//!
//! Decides what has to happen to a single resource: the live state is probed once,
//! then the descriptor and the probe result are turned into the exact statements
//! that converge the server. Planning never mutates anything, so the same plan backs
//! both a real run and a dry run.
use serde::Serialize;
use tracing::debug;

use crate::framework::core::execute::ReconcileError;
use crate::framework::core::infrastructure::{
    GrantTarget, LifecycleState, Resource, ResourceDescriptor, ResourceKind,
};
use crate::infrastructure::olap::clickhouse::errors::ClickhouseError;
use crate::infrastructure::olap::clickhouse::queries::{
    self, create_database_query, create_role_query, drop_query, grant_privileges_queries,
    grant_roles_query, named_collection_query, revoke_privileges_queries, revoke_roles_query,
    user_query, Statement,
};
use crate::infrastructure::olap::SqlExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedAction {
    Create,
    Alter,
    Drop,
    Grant,
    Revoke,
    NoOp,
}

/// Statements converging one resource, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationPlan {
    pub kind: ResourceKind,
    pub action: PlannedAction,
    pub statements: Vec<Statement>,
    /// Message reported once the statements ran
    pub msg: String,
}

impl ReconciliationPlan {
    fn no_op(kind: ResourceKind, msg: String) -> Self {
        Self {
            kind,
            action: PlannedAction::NoOp,
            statements: Vec::new(),
            msg,
        }
    }

    fn single(kind: ResourceKind, action: PlannedAction, statement: Statement, msg: String) -> Self {
        Self {
            kind,
            action,
            statements: vec![statement],
            msg,
        }
    }

    pub fn changes(&self) -> bool {
        !self.statements.is_empty()
    }
}

/// Whether the live state has to be probed before building the plan.
///
/// Only `present` on a named kind needs it. Drops are `IF EXISTS` and grants are
/// issued unconditionally.
pub fn needs_probe(descriptor: &ResourceDescriptor) -> bool {
    descriptor.state == LifecycleState::Present && descriptor.kind() != ResourceKind::Grant
}

/// Runs the existence probe against the system catalog of the resource kind.
pub async fn probe_exists(
    executor: &dyn SqlExecutor,
    kind: ResourceKind,
    name: &str,
) -> Result<bool, ReconcileError> {
    let sql = queries::existence_query(kind)?;
    debug!("Probing {} '{}': {}", kind.label(), name, sql);
    let count = executor
        .count(&sql, name)
        .await
        .map_err(|source| ReconcileError::Query {
            statement: sql.replace('?', &format!("'{name}'")),
            source,
        })?;
    Ok(count > 0)
}

/// Builds the plan for a descriptor given the probe result.
///
/// `exists` is ignored for kinds and states that do not depend on it.
pub fn build_plan(
    descriptor: &ResourceDescriptor,
    exists: bool,
) -> Result<ReconciliationPlan, ClickhouseError> {
    let cluster = descriptor.cluster.as_deref();
    let kind = descriptor.kind();
    let absent = descriptor.state == LifecycleState::Absent;

    let plan = match &descriptor.resource {
        Resource::Database(db) if absent => ReconciliationPlan::single(
            kind,
            PlannedAction::Drop,
            drop_query(kind, &db.name, cluster)?,
            format!("Database '{}' deleted", db.name),
        ),
        Resource::Database(db) => {
            // Validate even when nothing will be run
            let statement = create_database_query(db, cluster)?;
            if exists {
                ReconciliationPlan::no_op(kind, format!("Database '{}' already exists", db.name))
            } else {
                ReconciliationPlan::single(
                    kind,
                    PlannedAction::Create,
                    statement,
                    format!("Database '{}' created", db.name),
                )
            }
        }

        Resource::NamedCollection(collection) if absent => ReconciliationPlan::single(
            kind,
            PlannedAction::Drop,
            drop_query(kind, &collection.name, cluster)?,
            format!("Named collection '{}' deleted", collection.name),
        ),
        Resource::NamedCollection(collection) => ReconciliationPlan::single(
            kind,
            if exists {
                PlannedAction::Alter
            } else {
                PlannedAction::Create
            },
            named_collection_query(collection, cluster, exists)?,
            format!(
                "Named collection '{}' {}",
                collection.name,
                if exists { "changed" } else { "created" }
            ),
        ),

        Resource::Role(role) if absent => ReconciliationPlan::single(
            kind,
            PlannedAction::Drop,
            drop_query(kind, &role.name, cluster)?,
            format!("Role '{}' deleted", role.name),
        ),
        Resource::Role(role) => {
            // An existing role is reported unchanged, its settings are never altered.
            // The no-op is intended: rerunning the same role must report changed=false.
            let statement = create_role_query(role, cluster)?;
            if exists {
                ReconciliationPlan::no_op(kind, format!("Role '{}' already exists", role.name))
            } else {
                ReconciliationPlan::single(
                    kind,
                    PlannedAction::Create,
                    statement,
                    format!("Role '{}' created", role.name),
                )
            }
        }

        Resource::User(user) if absent => ReconciliationPlan::single(
            kind,
            PlannedAction::Drop,
            drop_query(kind, &user.name, cluster)?,
            format!("User '{}' deleted", user.name),
        ),
        Resource::User(user) => ReconciliationPlan::single(
            kind,
            if exists {
                PlannedAction::Alter
            } else {
                PlannedAction::Create
            },
            user_query(user, cluster, exists)?,
            format!(
                "User '{}' {}",
                user.name,
                if exists { "changed" } else { "created" }
            ),
        ),

        Resource::Grant(grant) => {
            let roles = grant.roles.join(", ");
            match (grant.target()?, absent) {
                (GrantTarget::Privileges(entries), false) => ReconciliationPlan {
                    kind,
                    action: PlannedAction::Grant,
                    statements: grant_privileges_queries(grant, entries, cluster)?,
                    msg: format!("Privileges for [{roles}] granted"),
                },
                (GrantTarget::Privileges(entries), true) => ReconciliationPlan {
                    kind,
                    action: PlannedAction::Revoke,
                    statements: revoke_privileges_queries(grant, entries, cluster)?,
                    msg: format!("Revoked privileges from [{roles}]"),
                },
                (GrantTarget::Roles(grantees), false) => ReconciliationPlan::single(
                    kind,
                    PlannedAction::Grant,
                    grant_roles_query(grant, grantees, cluster)?,
                    format!("Granted [{roles}] to [{}]", grantees.join(", ")),
                ),
                (GrantTarget::Roles(grantees), true) => ReconciliationPlan::single(
                    kind,
                    PlannedAction::Revoke,
                    revoke_roles_query(grant, grantees, cluster)?,
                    format!("Revoked [{roles}] from [{}]", grantees.join(", ")),
                ),
            }
        }
    };

    Ok(plan)
}

/// Checks a descriptor can be rendered whatever the live state turns out to be.
///
/// Run before connecting so parameter mistakes never reach the server.
pub fn validate_descriptor(descriptor: &ResourceDescriptor) -> Result<(), ClickhouseError> {
    build_plan(descriptor, false)?;
    if needs_probe(descriptor) {
        build_plan(descriptor, true)?;
    }
    Ok(())
}

/// Probes the live state when needed and builds the plan.
pub async fn plan_changes(
    executor: &dyn SqlExecutor,
    descriptor: &ResourceDescriptor,
) -> Result<ReconciliationPlan, ReconcileError> {
    validate_descriptor(descriptor)?;

    let exists = match descriptor.resource.name() {
        Some(name) if needs_probe(descriptor) => {
            probe_exists(executor, descriptor.kind(), name).await?
        }
        _ => false,
    };

    let plan = build_plan(descriptor, exists)?;
    debug!(
        "Planned {:?} for {} with {} statement(s)",
        plan.action,
        descriptor.kind().label(),
        plan.statements.len()
    );
    Ok(plan)
}
