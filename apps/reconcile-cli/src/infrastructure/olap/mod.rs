use serde::Serialize;
use serde_json::Value;

pub mod clickhouse;
pub mod clickhouse_http_client;

/// A named server-side query parameter, sent as `param_<name>=<value>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

impl QueryParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn url_key(&self) -> String {
        format!("param_{}", self.name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SqlClientError {
    #[error("ClickHouse client error: {0}")]
    Client(#[from] ::clickhouse::error::Error),
    #[error("ClickHouse HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ClickHouse returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("Failed to decode result row: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Operations the reconciler needs from the OLAP server.
#[async_trait::async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Fails when the server cannot be reached or rejects the credentials.
    async fn ping(&self) -> Result<(), SqlClientError>;

    /// Runs a single `count(*)` query whose only `?` placeholder is bound to `bind`.
    async fn count(&self, sql: &str, bind: &str) -> Result<u64, SqlClientError>;

    /// Runs a statement that returns no rows. The text is sent as is.
    async fn command(&self, sql: &str, params: &[QueryParam]) -> Result<(), SqlClientError>;

    /// Runs a statement and returns every row as a JSON array of column values.
    async fn fetch_rows(
        &self,
        sql: &str,
        params: &[QueryParam],
    ) -> Result<Vec<Value>, SqlClientError>;
}
