use serde::{Deserialize, Serialize};

use crate::utilities::constants::DEFAULT_POSTGRES_PORT;
use crate::utilities::json::deserialize_optional_string;

fn default_pg_port() -> u16 {
    DEFAULT_POSTGRES_PORT
}

/// A named collection holding the credentials of a PostgreSQL source.
///
/// Table engines reference the collection by name instead of repeating the
/// connection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCollection {
    #[serde(alias = "collection")]
    pub name: String,

    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub pg_user: Option<String>,
    #[serde(
        default,
        alias = "pg_password",
        deserialize_with = "deserialize_optional_string"
    )]
    pub pg_pswd: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub pg_host: Option<String>,
    #[serde(default = "default_pg_port")]
    pub pg_port: u16,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub pg_db: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub pg_schema: Option<String>,
}
