//! # ClickHouse OLAP Implementation
//!
//! Client construction and the [`SqlExecutor`] implementation used against a live server.
//! Statements go through the HTTP interface of the `clickhouse` crate, raw row sets
//! through [`clickhouse_http_client`](super::clickhouse_http_client).
//!
//! ## Usage Example
//! ```ignore
//! let client = create_client(config);
//! check_ready(&client).await?;
//! run_query_with_params("DROP ROLE IF EXISTS analyst", &[], &client).await?;
//! ```

use clickhouse::Client;
use serde_json::Value;
use tracing::debug;

use self::config::ClickHouseConfig;
use super::clickhouse_http_client::query_as_json_rows;
use super::{QueryParam, SqlClientError, SqlExecutor};

pub mod config;
pub mod errors;
pub mod queries;

/// Client bundled with the configuration it was built from.
#[derive(Clone)]
pub struct ConfiguredDBClient {
    pub client: Client,
    pub config: ClickHouseConfig,
}

/// Creates a configured ClickHouse client with the provided configuration
///
/// # Arguments
/// * `clickhouse_config` - Configuration for the ClickHouse connection
///
/// # Returns
/// * `ConfiguredDBClient` - A configured client ready for database operations
pub fn create_client(clickhouse_config: ClickHouseConfig) -> ConfiguredDBClient {
    ConfiguredDBClient {
        client: Client::default()
            .with_url(clickhouse_config.http_endpoint())
            .with_user(clickhouse_config.user.to_string())
            .with_password(clickhouse_config.password.to_string())
            .with_database(clickhouse_config.db_name.to_string()),
        config: clickhouse_config,
    }
}

/// The `clickhouse` crate treats `?` as a bind placeholder. Statements that are
/// not bound must have theirs escaped so passwords and literals survive untouched.
fn escape_placeholders(query: &str) -> String {
    query.replace('?', "??")
}

/// Executes a SQL statement with server-side query parameters (`{name:Type}` in the text).
pub async fn run_query_with_params(
    query: &str,
    params: &[QueryParam],
    configured_client: &ConfiguredDBClient,
) -> Result<(), clickhouse::error::Error> {
    let client = params
        .iter()
        .fold(configured_client.client.clone(), |client, param| {
            client.with_option(param.url_key(), param.value.clone())
        });
    client
        .query(&escape_placeholders(query))
        .execute()
        .await
}

/// Checks the server is reachable and accepts the credentials.
///
/// A single `SELECT 1`: connection problems are reported, never retried.
pub async fn check_ready(
    configured_client: &ConfiguredDBClient,
) -> Result<(), clickhouse::error::Error> {
    debug!(
        "Checking ClickHouse at {}",
        configured_client.config.display_url()
    );
    configured_client
        .client
        .query("SELECT 1")
        .fetch_one::<u8>()
        .await
        .map(|_| ())
}

#[async_trait::async_trait]
impl SqlExecutor for ConfiguredDBClient {
    async fn ping(&self) -> Result<(), SqlClientError> {
        Ok(check_ready(self).await?)
    }

    async fn count(&self, sql: &str, bind: &str) -> Result<u64, SqlClientError> {
        Ok(self
            .client
            .query(sql)
            .bind(bind)
            .fetch_one::<u64>()
            .await?)
    }

    async fn command(&self, sql: &str, params: &[QueryParam]) -> Result<(), SqlClientError> {
        Ok(run_query_with_params(sql, params, self).await?)
    }

    async fn fetch_rows(
        &self,
        sql: &str,
        params: &[QueryParam],
    ) -> Result<Vec<Value>, SqlClientError> {
        query_as_json_rows(self, sql, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_escaped() {
        assert_eq!(
            escape_placeholders("CREATE USER u IDENTIFIED WITH sha256_password BY 'a?b'"),
            "CREATE USER u IDENTIFIED WITH sha256_password BY 'a??b'"
        );
        assert_eq!(escape_placeholders("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_create_client_keeps_config() {
        let config = ClickHouseConfig {
            db_name: "analytics".to_string(),
            user: "admin".to_string(),
            password: "secret".to_string(),
            use_ssl: true,
            host: "ch.internal".to_string(),
            host_port: 8443,
        };
        let client = create_client(config.clone());
        assert_eq!(client.config, config);
        assert_eq!(client.config.http_endpoint(), "https://ch.internal:8443");
    }
}
