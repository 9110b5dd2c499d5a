//! Orchestrator parameter records.
//!
//! A record is a flat JSON object: connection fields, the common `state`, `cluster`
//! and `check` fields, a `kind` discriminator and the attributes of that kind.
//!
//! ```json
//! {"kind": "role", "name": "analyst", "state": "present", "login_user": "admin"}
//! ```

use serde::Deserialize;

use super::execute::Invocation;
use super::query::RawQuery;
use crate::framework::core::infrastructure::{
    Database, Grant, LifecycleState, NamedCollection, Resource, ResourceDescriptor, Role, User,
};
use crate::infrastructure::olap::clickhouse::config::ConnectionParams;
use crate::infrastructure::olap::clickhouse::errors::ClickhouseError;
use crate::utilities::secrets::{resolve_optional_runtime_env, RuntimeEnvResolutionError};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceParams {
    Database(Database),
    NamedCollection(NamedCollection),
    Role(Role),
    User(User),
    Grant(Grant),
    Query(RawQuery),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParameterRecord {
    #[serde(flatten)]
    pub connection: ConnectionParams,

    #[serde(default)]
    pub state: LifecycleState,

    #[serde(default)]
    pub cluster: Option<String>,

    /// Only report whether the named resource exists
    #[serde(default)]
    pub check: bool,

    /// Set by orchestrators running in check mode
    #[serde(default, rename = "_ansible_check_mode")]
    pub check_mode: bool,

    #[serde(flatten)]
    pub resource: ResourceParams,
}

#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    #[error("Failed to read parameter record: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to resolve secret: {0}")]
    Secret(#[from] RuntimeEnvResolutionError),
    #[error(transparent)]
    Invalid(#[from] ClickhouseError),
}

impl ParameterRecord {
    pub fn from_json(text: &str) -> Result<Self, ParameterError> {
        let mut record: ParameterRecord = serde_json::from_str(text)?;
        record.resolve_secrets()?;
        Ok(record)
    }

    /// Replaces secret markers with the values of the environment variables they name.
    fn resolve_secrets(&mut self) -> Result<(), RuntimeEnvResolutionError> {
        self.connection.login_password =
            resolve_optional_runtime_env(&self.connection.login_password)?;
        match &mut self.resource {
            ResourceParams::NamedCollection(collection) => {
                collection.pg_pswd = resolve_optional_runtime_env(&collection.pg_pswd)?;
            }
            ResourceParams::User(user) => {
                user.auth = resolve_optional_runtime_env(&user.auth)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Turns the record into what has to be run.
    pub fn into_invocation(self) -> Result<Invocation, ClickhouseError> {
        let resource = match self.resource {
            ResourceParams::Query(query) => return Ok(Invocation::Query(query)),
            ResourceParams::Database(db) => Resource::Database(db),
            ResourceParams::NamedCollection(collection) => Resource::NamedCollection(collection),
            ResourceParams::Role(role) => Resource::Role(role),
            ResourceParams::User(user) => Resource::User(user),
            ResourceParams::Grant(grant) => Resource::Grant(grant),
        };

        if self.check {
            let kind = resource.kind();
            let name = resource.name().map(str::to_string).ok_or_else(|| {
                ClickhouseError::invalid_parameters(format!(
                    "'check' is not available for {}",
                    kind.label().to_lowercase()
                ))
            })?;
            return Ok(Invocation::Check { kind, name });
        }

        Ok(Invocation::Reconcile(ResourceDescriptor::new(
            resource,
            self.state,
            self.cluster,
        )))
    }
}
