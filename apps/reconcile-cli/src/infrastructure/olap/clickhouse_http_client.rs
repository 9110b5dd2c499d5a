//! Raw row sets over the ClickHouse HTTP interface
//!
//! The `clickhouse` crate deserializes rows into known structs. Ad-hoc queries have no
//! known shape, so they are sent with `reqwest` and read back as `JSONCompactEachRow`:
//! one JSON array of column values per line.

use serde_json::Value;
use tracing::debug;

use crate::infrastructure::olap::clickhouse::ConfiguredDBClient;
use crate::infrastructure::olap::{QueryParam, SqlClientError};

/// Execute a query and return every row as a JSON array
///
/// # Arguments
/// * `client` - Configured ClickHouse client, only its connection settings are used
/// * `query` - SQL query string, sent verbatim
/// * `params` - Server-side query parameters referenced as `{name:Type}` in the query
pub async fn query_as_json_rows(
    client: &ConfiguredDBClient,
    query: &str,
    params: &[QueryParam],
) -> Result<Vec<Value>, SqlClientError> {
    debug!("Executing HTTP query: {}", query);

    let config = &client.config;
    let param_pairs: Vec<(String, String)> = params
        .iter()
        .map(|p| (p.url_key(), p.value.clone()))
        .collect();

    let http_client = reqwest::Client::new();
    let response = http_client
        .post(config.http_endpoint())
        .query(&[("database", &config.db_name)])
        .query(&[("default_format", "JSONCompactEachRow")])
        .query(&param_pairs)
        .basic_auth(&config.user, Some(&config.password))
        .body(query.to_string())
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(SqlClientError::Server {
            status,
            body: body.trim().to_string(),
        });
    }

    parse_compact_rows(&response.text().await?)
}

/// Parses one JSON value per non-empty line.
pub fn parse_compact_rows(body: &str) -> Result<Vec<Value>, SqlClientError> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(SqlClientError::from))
        .collect()
}
