//! Runtime environment variable resolution for secrets
//!
//! Parameter records are often committed next to playbooks. Instead of embedding a
//! password, a record may carry a marker that is resolved from the environment of the
//! process at runtime: `__CH_RECONCILE_ENV__:PG_READER_PASSWORD`.
//!
//! ```ignore
//! use ch_reconcile::utilities::secrets::resolve_runtime_env;
//!
//! let value = "my-static-value";
//! assert_eq!(resolve_runtime_env(value)?, "my-static-value");
//! ```

use std::env;

/// Prefix used to mark values that should be resolved from environment variables
pub const RUNTIME_ENV_PREFIX: &str = "__CH_RECONCILE_ENV__:";

/// Value shown in logs and result records instead of a secret
pub const REDACTED: &str = "******";

/// Resolves a value that may contain a runtime environment variable marker.
///
/// Values without the marker are returned unchanged.
pub fn resolve_runtime_env(value: &str) -> Result<String, RuntimeEnvResolutionError> {
    if let Some(env_var_name) = value.strip_prefix(RUNTIME_ENV_PREFIX) {
        if env_var_name.is_empty() {
            return Err(RuntimeEnvResolutionError::EmptyVariableName);
        }

        env::var(env_var_name).map_err(|_| RuntimeEnvResolutionError::VariableNotFound {
            var_name: env_var_name.to_string(),
        })
    } else {
        Ok(value.to_string())
    }
}

/// Resolves an optional value that may contain a runtime environment variable marker.
pub fn resolve_optional_runtime_env(
    value: &Option<String>,
) -> Result<Option<String>, RuntimeEnvResolutionError> {
    value.as_deref().map(resolve_runtime_env).transpose()
}

/// Errors that can occur during runtime environment variable resolution
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RuntimeEnvResolutionError {
    #[error("Secret marker has an empty variable name")]
    EmptyVariableName,

    #[error("Environment variable '{var_name}' referenced by a secret marker is not set")]
    VariableNotFound { var_name: String },
}
