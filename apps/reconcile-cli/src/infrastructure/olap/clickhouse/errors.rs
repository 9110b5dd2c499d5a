#[derive(Debug, thiserror::Error)]
#[error("failed to build clickhouse statement")]
#[non_exhaustive]
pub enum ClickhouseError {
    #[error("Clickhouse - Invalid parameters: {message}")]
    InvalidParameters { message: String },
    #[error("Clickhouse - Invalid {identifier_type}: '{name}' - {reason}")]
    InvalidIdentifier {
        identifier_type: String,
        name: String,
        reason: String,
    },
    #[error("Clickhouse - Invalid privilege list '{privileges}' - {reason}")]
    InvalidPrivilege { privileges: String, reason: String },
    #[error("Clickhouse - Failed to render statement")]
    QueryRender(#[from] handlebars::RenderError),
}

impl ClickhouseError {
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        ClickhouseError::InvalidParameters {
            message: message.into(),
        }
    }
}

/// Checks if a string is a valid ClickHouse identifier.
///
/// ClickHouse identifiers (database names, user names, role names, cluster names, etc.) must:
/// - Be non-empty
/// - Contain only alphanumeric characters and underscores
/// - Not start with a digit
///
/// Every identifier is interpolated unquoted into DDL text, so this is what keeps
/// quotes and statement terminators out of the generated statements.
pub fn is_valid_clickhouse_identifier(name: &str) -> bool {
    match name.chars().next() {
        Some(first) => {
            !first.is_ascii_digit() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Validates that a string is a valid ClickHouse identifier, returning a typed error on failure.
pub fn validate_clickhouse_identifier(
    name: &str,
    identifier_type: &str,
) -> Result<(), ClickhouseError> {
    if is_valid_clickhouse_identifier(name) {
        return Ok(());
    }

    let reason = if name.is_empty() {
        "cannot be empty"
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        "cannot start with a digit"
    } else {
        "contains invalid characters (only alphanumeric and underscore allowed)"
    };

    Err(ClickhouseError::InvalidIdentifier {
        identifier_type: identifier_type.to_string(),
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

/// Validates every identifier of a list, e.g. the grantees of a user.
pub fn validate_clickhouse_identifiers(
    names: &[String],
    identifier_type: &str,
) -> Result<(), ClickhouseError> {
    names
        .iter()
        .try_for_each(|name| validate_clickhouse_identifier(name, identifier_type))
}

/// Validates the target of a GRANT / REVOKE.
///
/// Accepted shapes: `db.table`, `db.*`, `*.*`, `*` and a bare `table`.
pub fn validate_grant_object(object: &str) -> Result<(), ClickhouseError> {
    let parts: Vec<&str> = object.split('.').collect();
    if parts.len() > 2 {
        return Err(ClickhouseError::InvalidIdentifier {
            identifier_type: "grant object".to_string(),
            name: object.to_string(),
            reason: "expected at most one '.' separating database and table".to_string(),
        });
    }

    // A wildcard database only makes sense with a wildcard table
    if parts.len() == 2 && parts[0] == "*" && parts[1] != "*" {
        return Err(ClickhouseError::InvalidIdentifier {
            identifier_type: "grant object".to_string(),
            name: object.to_string(),
            reason: "'*' database requires '*' table".to_string(),
        });
    }

    parts
        .iter()
        .filter(|part| **part != "*")
        .try_for_each(|part| validate_clickhouse_identifier(part, "grant object"))
}

/// Validates a single privilege such as `SELECT`, `ACCESS MANAGEMENT` or `SELECT(id, name)`.
pub fn validate_privilege(privilege: &str) -> Result<(), ClickhouseError> {
    let invalid = |reason: &str| ClickhouseError::InvalidPrivilege {
        privileges: privilege.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = privilege.trim();
    if trimmed.is_empty() {
        return Err(invalid("privilege cannot be empty"));
    }

    let (keyword, columns) = match trimmed.split_once('(') {
        Some((keyword, rest)) => {
            let columns = rest
                .strip_suffix(')')
                .ok_or_else(|| invalid("unterminated column list"))?;
            (keyword, Some(columns))
        }
        None => (trimmed, None),
    };

    if keyword.trim().is_empty()
        || !keyword
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '_' || c == ' ')
    {
        return Err(invalid(
            "privilege keywords may only contain letters, underscores and spaces",
        ));
    }

    if let Some(columns) = columns {
        for column in columns.split(',') {
            validate_clickhouse_identifier(column.trim(), "privilege column")?;
        }
    }

    Ok(())
}

/// Quotes a value as a ClickHouse string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
