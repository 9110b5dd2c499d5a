//! Raw statement execution.
//!
//! Statements are sent as written. Positional parameters are never spliced into the
//! text: the i-th parameter is sent as the server-side query parameter `p<i>`, which
//! the statement references as `{p1:String}`, `{p2:UInt32}` and so on.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::execute::{ReconcileError, ReconciliationOutcome};
use crate::infrastructure::olap::clickhouse::errors::{
    validate_clickhouse_identifier, ClickhouseError,
};
use crate::infrastructure::olap::{QueryParam, SqlExecutor};
use crate::utilities::json::scalar_to_string;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuery {
    pub query: String,

    #[serde(default, deserialize_with = "deserialize_parameters")]
    pub parameters: Vec<String>,

    /// Database the statement runs in, the connection default otherwise
    #[serde(default)]
    pub db: Option<String>,
}

/// Parameters are kept whole: a string parameter may legitimately contain commas.
fn deserialize_parameters<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().map(scalar_to_string).collect()),
        Some(other) => Ok(vec![scalar_to_string(&other)]),
    }
}

impl RawQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: Vec::new(),
            db: None,
        }
    }

    pub fn validate(&self) -> Result<(), ClickhouseError> {
        if self.query.trim().is_empty() {
            return Err(ClickhouseError::invalid_parameters("'query' is required"));
        }
        match &self.db {
            Some(db) => validate_clickhouse_identifier(db, "database name"),
            None => Ok(()),
        }
    }

    /// Row returning statements are recognized by their leading keyword.
    pub fn is_select(&self) -> bool {
        self.query
            .split_whitespace()
            .next()
            .is_some_and(|keyword| keyword.eq_ignore_ascii_case("SELECT"))
    }

    pub fn query_params(&self) -> Vec<QueryParam> {
        self.parameters
            .iter()
            .enumerate()
            .map(|(index, value)| QueryParam::new(format!("p{}", index + 1), value.clone()))
            .collect()
    }
}

/// Runs a raw statement.
///
/// `SELECT` statements report their rows and `changed=false`, anything else reports
/// the executed text and `changed=true`. A dry run executes nothing.
pub async fn run_raw_query(
    executor: &dyn SqlExecutor,
    query: &RawQuery,
    dry_run: bool,
) -> Result<ReconciliationOutcome, ReconcileError> {
    query.validate()?;

    if dry_run {
        info!("Dry run, query not executed");
        return Ok(ReconciliationOutcome::Executed {
            changed: false,
            executed_query: query.query.clone(),
        });
    }

    let params = query.query_params();
    debug!("Running query with {} parameter(s): {}", params.len(), query.query);
    let to_query_error = |source| ReconcileError::Query {
        statement: query.query.clone(),
        source,
    };

    if query.is_select() {
        let rows = executor
            .fetch_rows(&query.query, &params)
            .await
            .map_err(to_query_error)?;
        info!("Query returned {} row(s)", rows.len());
        Ok(ReconciliationOutcome::Rows {
            changed: false,
            query_result: rows,
        })
    } else {
        executor
            .command(&query.query, &params)
            .await
            .map_err(to_query_error)?;
        Ok(ReconciliationOutcome::Executed {
            changed: true,
            executed_query: query.query.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingExecutor;
    use serde_json::json;

    #[test]
    fn test_select_detection() {
        assert!(RawQuery::new("select name from system.users").is_select());
        assert!(RawQuery::new("\n  SELECT 1").is_select());
        assert!(!RawQuery::new("INSERT INTO t1 SELECT * FROM t2").is_select());
        assert!(!RawQuery::new("selection").is_select());
    }

    #[test]
    fn test_parameters_are_not_split() {
        let query: RawQuery = serde_json::from_value(json!({
            "query": "INSERT INTO t VALUES ({p1:UInt32}, {p2:String})",
            "parameters": [11, "Jhon, Jr."],
        }))
        .unwrap();
        assert_eq!(
            query.query_params(),
            vec![QueryParam::new("p1", "11"), QueryParam::new("p2", "Jhon, Jr.")]
        );
    }

    #[tokio::test]
    async fn test_select_returns_rows() {
        let rows = vec![json!(["user1"]), json!(["user2"])];
        let executor = RecordingExecutor::default().with_rows(rows.clone());
        let outcome = run_raw_query(
            &executor,
            &RawQuery::new("select name from system.users where name != 'default'"),
            false,
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            ReconciliationOutcome::Rows {
                changed: false,
                query_result: rows
            }
        );
        assert!(executor.commands().is_empty());
    }

    #[tokio::test]
    async fn test_statement_is_sent_verbatim_with_bound_params() {
        let executor = RecordingExecutor::default();
        let mut query = RawQuery::new("INSERT INTO t1 VALUES ({p1:UInt32}, {p2:String})");
        query.parameters = vec!["11".to_string(), "O'Brien".to_string()];

        let outcome = run_raw_query(&executor, &query, false).await.unwrap();
        assert_eq!(
            outcome,
            ReconciliationOutcome::Executed {
                changed: true,
                executed_query: "INSERT INTO t1 VALUES ({p1:UInt32}, {p2:String})".to_string()
            }
        );
        assert_eq!(
            executor.command_params(),
            vec![vec![QueryParam::new("p1", "11"), QueryParam::new("p2", "O'Brien")]]
        );
    }

    #[tokio::test]
    async fn test_failed_query_reports_text() {
        let executor = RecordingExecutor::default().failing_on("DROP TABLE");
        let err = run_raw_query(&executor, &RawQuery::new("DROP TABLE missing"), false)
            .await
            .unwrap_err();
        assert_eq!(err.statement(), Some("DROP TABLE missing"));
    }

    #[tokio::test]
    async fn test_dry_run_and_validation() {
        let executor = RecordingExecutor::default();
        let outcome = run_raw_query(&executor, &RawQuery::new("TRUNCATE TABLE t"), true)
            .await
            .unwrap();
        assert!(!outcome.changed());
        assert!(executor.commands().is_empty());

        assert!(matches!(
            run_raw_query(&executor, &RawQuery::new("  "), false).await,
            Err(ReconcileError::Configuration(_))
        ));
    }
}
