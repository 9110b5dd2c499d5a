//! Desired-state descriptors of the ClickHouse objects this tool manages.
//!
//! Descriptors are plain data: they are deserialized from orchestrator parameter
//! records or built from command line arguments, and rendered into DDL by
//! `infrastructure::olap::clickhouse::queries`.

use serde::{Deserialize, Serialize};

pub mod database;
pub mod grant;
pub mod named_collection;
pub mod role;
pub mod user;

pub use database::Database;
pub use grant::{Grant, GrantTarget, PrivilegeEntry};
pub use named_collection::NamedCollection;
pub use role::Role;
pub use user::{AuthType, User};

/// Desired lifecycle of a resource.
///
/// `abscent` is accepted as input for compatibility with existing playbooks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Present,
    #[serde(alias = "abscent")]
    #[value(alias = "abscent")]
    Absent,
}

/// Kinds of resources handled by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Database,
    NamedCollection,
    Role,
    User,
    Grant,
}

impl ResourceKind {
    /// System catalog table listing live objects of this kind, filtered by `name`.
    pub fn system_table(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Database => Some("system.databases"),
            ResourceKind::NamedCollection => Some("system.named_collections"),
            ResourceKind::Role => Some("system.roles"),
            ResourceKind::User => Some("system.users"),
            ResourceKind::Grant => None,
        }
    }

    /// Human readable label used in result messages
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Database => "Database",
            ResourceKind::NamedCollection => "Named collection",
            ResourceKind::Role => "Role",
            ResourceKind::User => "User",
            ResourceKind::Grant => "Grant",
        }
    }
}

/// A resource together with the desired state and the cluster scope of its statements.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    pub resource: Resource,
    pub state: LifecycleState,
    /// When set every statement is distributed with `ON CLUSTER`
    pub cluster: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Database(Database),
    NamedCollection(NamedCollection),
    Role(Role),
    User(User),
    Grant(Grant),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Database(_) => ResourceKind::Database,
            Resource::NamedCollection(_) => ResourceKind::NamedCollection,
            Resource::Role(_) => ResourceKind::Role,
            Resource::User(_) => ResourceKind::User,
            Resource::Grant(_) => ResourceKind::Grant,
        }
    }

    /// Name used to probe the system catalog, `None` for grants.
    pub fn name(&self) -> Option<&str> {
        match self {
            Resource::Database(db) => Some(&db.name),
            Resource::NamedCollection(collection) => Some(&collection.name),
            Resource::Role(role) => Some(&role.name),
            Resource::User(user) => Some(&user.name),
            Resource::Grant(_) => None,
        }
    }
}

impl ResourceDescriptor {
    pub fn new(resource: Resource, state: LifecycleState, cluster: Option<String>) -> Self {
        Self {
            resource,
            state,
            // An empty cluster parameter means "no cluster"
            cluster: cluster.filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }
}
