use serde::{Deserialize, Serialize};

use crate::utilities::json::{deserialize_settings, SettingsMap};

/// A ClickHouse database.
///
/// The engine cannot be altered once the database exists, so a database that is
/// already present is left untouched even if `engine` differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(alias = "db_name", alias = "db", alias = "database")]
    pub name: String,

    /// Database engine, e.g. `Atomic` or `PostgreSQL`. Server default when unset.
    #[serde(default)]
    pub engine: Option<String>,

    /// Engine arguments for external sources. Only the values are used, in order,
    /// e.g. `{"host:port": "10.0.0.1:5432", "database": "pg_db"}`.
    #[serde(default, deserialize_with = "deserialize_settings")]
    pub engine_settings: SettingsMap,
}
