//! DDL statement builders.
//!
//! Every statement is rendered from a handlebars template. Identifiers are validated
//! before rendering and literal values are quoted, so no caller supplied text reaches
//! a template unchecked.

use handlebars::{no_escape, Handlebars};
use serde_json::{json, Value};
use std::net::IpAddr;

use super::errors::{
    quote_literal, validate_clickhouse_identifier, validate_clickhouse_identifiers,
    validate_grant_object, validate_privilege, ClickhouseError,
};
use crate::framework::core::infrastructure::{
    Database, Grant, NamedCollection, PrivilegeEntry, ResourceKind, Role, User,
};
use crate::utilities::json::{scalar_to_string, SettingsMap};
use crate::utilities::secrets::REDACTED;

/// A rendered statement and the form of it that is safe to log and report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub display: String,
}

impl Statement {
    fn new(sql: String, secrets: &[&str]) -> Self {
        let display = secrets
            .iter()
            .filter(|secret| !secret.is_empty())
            .fold(sql.clone(), |display, secret| {
                display.replace(&quote_literal(secret), &format!("'{REDACTED}'"))
            });
        Self { sql, display }
    }

    fn public(sql: String) -> Self {
        Self {
            display: sql.clone(),
            sql,
        }
    }
}

fn render(template: &str, context: &Value) -> Result<String, ClickhouseError> {
    let mut reg = Handlebars::new();
    reg.register_escape_fn(no_escape);
    Ok(reg.render_template(template, context)?)
}

fn validate_cluster(cluster: Option<&str>) -> Result<(), ClickhouseError> {
    match cluster {
        Some(cluster) => validate_clickhouse_identifier(cluster, "cluster name"),
        None => Ok(()),
    }
}

static EXISTS_TEMPLATE: &str = "SELECT count(*) FROM {{table}} WHERE name = ?";

/// Probe counting live objects of a kind by exact name. The name is bound by the client.
pub fn existence_query(kind: ResourceKind) -> Result<String, ClickhouseError> {
    let table = kind.system_table().ok_or_else(|| {
        ClickhouseError::invalid_parameters(format!(
            "{} has no system catalog to check existence against",
            kind.label()
        ))
    })?;
    render(EXISTS_TEMPLATE, &json!({ "table": table }))
}

static DROP_TEMPLATE: &str =
    "DROP {{object_type}} IF EXISTS {{name}}{{#if cluster}} ON CLUSTER {{cluster}}{{/if}}";

/// `DROP ... IF EXISTS` for every droppable kind.
pub fn drop_query(
    kind: ResourceKind,
    name: &str,
    cluster: Option<&str>,
) -> Result<Statement, ClickhouseError> {
    let object_type = match kind {
        ResourceKind::Database => "DATABASE",
        ResourceKind::NamedCollection => "NAMED COLLECTION",
        ResourceKind::Role => "ROLE",
        ResourceKind::User => "USER",
        ResourceKind::Grant => {
            return Err(ClickhouseError::invalid_parameters(
                "grants are revoked, not dropped",
            ))
        }
    };
    validate_clickhouse_identifier(name, &format!("{} name", kind.label().to_lowercase()))?;
    validate_cluster(cluster)?;

    let context = json!({
        "object_type": object_type,
        "name": name,
        "cluster": cluster,
    });
    Ok(Statement::public(render(DROP_TEMPLATE, &context)?))
}

static CREATE_DATABASE_TEMPLATE: &str = "CREATE DATABASE {{name}}{{#if cluster}} ON CLUSTER {{cluster}}{{/if}}{{#if engine}} ENGINE = {{engine}}{{#if engine_args}} ({{engine_args}}){{/if}}{{/if}}";

pub fn create_database_query(
    database: &Database,
    cluster: Option<&str>,
) -> Result<Statement, ClickhouseError> {
    validate_clickhouse_identifier(&database.name, "database name")?;
    validate_cluster(cluster)?;
    if let Some(engine) = &database.engine {
        validate_clickhouse_identifier(engine, "database engine")?;
    } else if !database.engine_settings.is_empty() {
        return Err(ClickhouseError::invalid_parameters(
            "'engine_settings' requires 'engine'",
        ));
    }

    let engine_values: Vec<String> = database
        .engine_settings
        .values()
        .map(scalar_to_string)
        .collect();
    let engine_args = engine_values
        .iter()
        .map(|value| quote_literal(value))
        .collect::<Vec<_>>()
        .join(", ");

    let context = json!({
        "name": database.name,
        "cluster": cluster,
        "engine": database.engine,
        "engine_args": engine_args,
    });
    // Engine arguments of external databases usually carry a password
    let secrets: Vec<&str> = database
        .engine_settings
        .iter()
        .filter(|(key, _)| key.to_lowercase().contains("password"))
        .filter_map(|(_, value)| value.as_str())
        .collect();
    Ok(Statement::new(
        render(CREATE_DATABASE_TEMPLATE, &context)?,
        &secrets,
    ))
}

static NAMED_COLLECTION_TEMPLATE: &str = "{{verb}} NAMED COLLECTION {{name}}{{#if cluster}} ON CLUSTER {{cluster}}{{/if}} {{keyword}} user = {{user}}, password = {{password}}, host = {{host}}, port = {{port}}, database = {{database}}{{#if schema}}, schema = {{schema}}{{/if}}";

/// `CREATE NAMED COLLECTION ... AS` for a new collection, `ALTER ... SET` for an existing one.
pub fn named_collection_query(
    collection: &NamedCollection,
    cluster: Option<&str>,
    exists: bool,
) -> Result<Statement, ClickhouseError> {
    validate_clickhouse_identifier(&collection.name, "named collection name")?;
    validate_cluster(cluster)?;

    let required = |field: &Option<String>, param: &str| {
        field
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(quote_literal)
            .ok_or_else(|| {
                ClickhouseError::invalid_parameters(format!(
                    "'{param}' is required for named collection '{}'",
                    collection.name
                ))
            })
    };

    let (verb, keyword) = if exists {
        ("ALTER", "SET")
    } else {
        ("CREATE", "AS")
    };
    let password = collection.pg_pswd.clone().unwrap_or_default();

    let context = json!({
        "verb": verb,
        "keyword": keyword,
        "name": collection.name,
        "cluster": cluster,
        "user": required(&collection.pg_user, "pg_user")?,
        "password": quote_literal(&password),
        "host": required(&collection.pg_host, "pg_host")?,
        "port": collection.pg_port,
        "database": required(&collection.pg_db, "pg_db")?,
        "schema": collection.pg_schema.as_deref().filter(|s| !s.is_empty()).map(quote_literal),
    });
    Ok(Statement::new(
        render(NAMED_COLLECTION_TEMPLATE, &context)?,
        &[password.as_str()],
    ))
}

/// Renders `name=value READONLY, ...`.
///
/// Numbers and booleans are emitted bare, strings holding a finite number too,
/// anything else is quoted.
pub fn settings_clause(settings: &SettingsMap) -> Result<String, ClickhouseError> {
    settings
        .iter()
        .map(|(name, value)| {
            validate_clickhouse_identifier(name, "setting name")?;
            let rendered = match value {
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
                Value::String(s) if s.trim().parse::<f64>().is_ok_and(f64::is_finite) => {
                    s.trim().to_string()
                }
                Value::String(s) => quote_literal(s),
                other => {
                    return Err(ClickhouseError::invalid_parameters(format!(
                        "setting '{name}' has an unsupported value {other}"
                    )))
                }
            };
            Ok(format!("{name}={rendered} READONLY"))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|parts| parts.join(", "))
}

static CREATE_ROLE_TEMPLATE: &str = "CREATE ROLE IF NOT EXISTS {{name}}{{#if cluster}} ON CLUSTER {{cluster}}{{/if}}{{#if settings}} SETTINGS {{settings}}{{/if}}";

pub fn create_role_query(role: &Role, cluster: Option<&str>) -> Result<Statement, ClickhouseError> {
    validate_clickhouse_identifier(&role.name, "role name")?;
    validate_cluster(cluster)?;

    let context = json!({
        "name": role.name,
        "cluster": cluster,
        "settings": settings_clause(&role.settings)?,
    });
    Ok(Statement::public(render(CREATE_ROLE_TEMPLATE, &context)?))
}

/// Renders the `HOST` clause from allowed hosts.
///
/// `ANY`, `NONE` and `LOCAL` are keywords, addresses and subnets become `IP '...'`,
/// everything else is matched by `NAME '...'`.
pub fn hosts_clause(hosts: &[String]) -> Result<String, ClickhouseError> {
    let keywords: Vec<String> = hosts
        .iter()
        .map(|h| h.to_uppercase())
        .filter(|h| matches!(h.as_str(), "ANY" | "NONE" | "LOCAL"))
        .collect();
    if keywords.iter().any(|k| k == "ANY" || k == "NONE") {
        if hosts.len() > 1 {
            return Err(ClickhouseError::invalid_parameters(
                "'ANY' and 'NONE' cannot be combined with other allowed hosts",
            ));
        }
        return Ok(keywords[0].clone());
    }

    let parts = hosts
        .iter()
        .map(|host| {
            if host.eq_ignore_ascii_case("LOCAL") {
                Ok("LOCAL".to_string())
            } else if is_ip_or_subnet(host) {
                Ok(format!("IP {}", quote_literal(host)))
            } else if host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
            {
                Ok(format!("NAME {}", quote_literal(host)))
            } else {
                Err(ClickhouseError::InvalidIdentifier {
                    identifier_type: "allowed host".to_string(),
                    name: host.clone(),
                    reason: "expected an IP address, a subnet or a host name".to_string(),
                })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(", "))
}

fn is_ip_or_subnet(host: &str) -> bool {
    match host.split_once('/') {
        Some((address, mask)) => {
            address.parse::<IpAddr>().is_ok()
                && (mask.parse::<u8>().is_ok() || mask.parse::<IpAddr>().is_ok())
        }
        None => host.parse::<IpAddr>().is_ok(),
    }
}

static USER_TEMPLATE: &str = "{{verb}} USER {{name}}{{#if cluster}} ON CLUSTER {{cluster}}{{/if}}{{#if auth_type}} IDENTIFIED WITH {{auth_type}}{{/if}}{{#if auth}} BY {{auth}}{{/if}}{{#if hosts}} HOST {{hosts}}{{/if}}{{#if roles}} DEFAULT ROLE {{roles}}{{/if}}{{#if database}} DEFAULT DATABASE {{database}}{{/if}}{{#if grantees}} GRANTEES {{grantees}}{{/if}}{{#if settings}} SETTINGS {{settings}}{{/if}}";

/// `CREATE USER` for a new user, `ALTER USER` with the same clauses for an existing one.
pub fn user_query(
    user: &User,
    cluster: Option<&str>,
    exists: bool,
) -> Result<Statement, ClickhouseError> {
    validate_clickhouse_identifier(&user.name, "user name")?;
    validate_cluster(cluster)?;
    validate_clickhouse_identifiers(&user.roles, "default role")?;
    validate_clickhouse_identifiers(&user.grantees, "grantee")?;
    if let Some(database) = &user.database {
        validate_clickhouse_identifier(database, "default database")?;
    }

    let auth_type = user.effective_auth_type();
    let secret = user.auth.as_deref().filter(|a| !a.is_empty());
    match (auth_type, secret) {
        (Some(auth_type), Some(_)) if !auth_type.requires_secret() => {
            return Err(ClickhouseError::invalid_parameters(format!(
                "user '{}': '{auth_type}' does not take a password",
                user.name
            )))
        }
        (Some(auth_type), None) if auth_type.requires_secret() => {
            return Err(ClickhouseError::invalid_parameters(format!(
                "user '{}': '{auth_type}' requires 'auth'",
                user.name
            )))
        }
        _ => {}
    }

    let context = json!({
        "verb": if exists { "ALTER" } else { "CREATE" },
        "name": user.name,
        "cluster": cluster,
        "auth_type": auth_type.map(|a| a.as_sql()),
        "auth": secret.map(quote_literal),
        "hosts": hosts_clause(&user.allowed_hosts)?,
        "roles": user.roles.join(","),
        "database": user.database,
        "grantees": user.grantees.join(","),
        "settings": settings_clause(&user.settings)?,
    });
    Ok(Statement::new(
        render(USER_TEMPLATE, &context)?,
        &[secret.unwrap_or_default()],
    ))
}

fn validate_entry(entry: &PrivilegeEntry) -> Result<(), ClickhouseError> {
    validate_grant_object(&entry.object)?;
    if entry.privileges.is_empty() {
        return Err(ClickhouseError::invalid_parameters(format!(
            "no privileges given for '{}'",
            entry.object
        )));
    }
    entry
        .privileges
        .iter()
        .try_for_each(|privilege| validate_privilege(privilege))
}

fn validate_roles(grant: &Grant) -> Result<(), ClickhouseError> {
    if grant.roles.is_empty() {
        return Err(ClickhouseError::invalid_parameters(
            "'role' must name at least one role or user",
        ));
    }
    validate_clickhouse_identifiers(&grant.roles, "role")
}

static GRANT_PRIVILEGES_TEMPLATE: &str = "GRANT{{#if cluster}} ON CLUSTER {{cluster}}{{/if}} {{privileges}} ON {{object}} TO {{grantees}}{{#if grant_option}} WITH GRANT OPTION{{/if}}{{#if replace_option}} WITH REPLACE OPTION{{/if}}";

/// One `GRANT` per privilege entry, in order.
///
/// `WITH REPLACE OPTION` is only put on the first statement: on the following ones it
/// would wipe what the previous statements just granted.
pub fn grant_privileges_queries(
    grant: &Grant,
    entries: &[PrivilegeEntry],
    cluster: Option<&str>,
) -> Result<Vec<Statement>, ClickhouseError> {
    validate_roles(grant)?;
    validate_cluster(cluster)?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            validate_entry(entry)?;
            let context = json!({
                "cluster": cluster,
                "privileges": entry.privileges.join(","),
                "object": entry.object,
                "grantees": grant.roles.join(","),
                "grant_option": grant.grant,
                "replace_option": grant.replace && index == 0,
            });
            Ok(Statement::public(render(
                GRANT_PRIVILEGES_TEMPLATE,
                &context,
            )?))
        })
        .collect()
}

static REVOKE_PRIVILEGES_TEMPLATE: &str = "REVOKE{{#if cluster}} ON CLUSTER {{cluster}}{{/if}} {{privileges}} ON {{object}} FROM {{grantees}}";

pub fn revoke_privileges_queries(
    grant: &Grant,
    entries: &[PrivilegeEntry],
    cluster: Option<&str>,
) -> Result<Vec<Statement>, ClickhouseError> {
    validate_roles(grant)?;
    validate_cluster(cluster)?;

    entries
        .iter()
        .map(|entry| {
            validate_entry(entry)?;
            let context = json!({
                "cluster": cluster,
                "privileges": entry.privileges.join(","),
                "object": entry.object,
                "grantees": grant.roles.join(","),
            });
            Ok(Statement::public(render(
                REVOKE_PRIVILEGES_TEMPLATE,
                &context,
            )?))
        })
        .collect()
}

static GRANT_ROLES_TEMPLATE: &str = "GRANT{{#if cluster}} ON CLUSTER {{cluster}}{{/if}} {{roles}} TO {{grantees}}{{#if admin_option}} WITH ADMIN OPTION{{/if}}{{#if replace_option}} WITH REPLACE OPTION{{/if}}";

pub fn grant_roles_query(
    grant: &Grant,
    grantees: &[String],
    cluster: Option<&str>,
) -> Result<Statement, ClickhouseError> {
    validate_roles(grant)?;
    validate_clickhouse_identifiers(grantees, "grantee")?;
    validate_cluster(cluster)?;

    let context = json!({
        "cluster": cluster,
        "roles": grant.roles.join(","),
        "grantees": grantees.join(","),
        "admin_option": grant.admin,
        "replace_option": grant.replace,
    });
    Ok(Statement::public(render(GRANT_ROLES_TEMPLATE, &context)?))
}

static REVOKE_ROLES_TEMPLATE: &str = "REVOKE{{#if admin_option}} ADMIN OPTION FOR{{/if}} {{roles}} FROM {{grantees}}{{#if cluster}} ON CLUSTER {{cluster}}{{/if}}";

pub fn revoke_roles_query(
    grant: &Grant,
    grantees: &[String],
    cluster: Option<&str>,
) -> Result<Statement, ClickhouseError> {
    validate_roles(grant)?;
    validate_clickhouse_identifiers(grantees, "grantee")?;
    validate_cluster(cluster)?;

    let context = json!({
        "cluster": cluster,
        "roles": grant.roles.join(","),
        "grantees": grantees.join(","),
        "admin_option": grant.admin,
    });
    Ok(Statement::public(render(REVOKE_ROLES_TEMPLATE, &context)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::core::infrastructure::AuthType;
    use serde_json::json;

    fn database(value: Value) -> Database {
        serde_json::from_value(value).unwrap()
    }

    fn user(value: Value) -> User {
        serde_json::from_value(value).unwrap()
    }

    fn grant(value: Value) -> Grant {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_create_database_on_cluster() {
        let db = database(json!({"name": "test_db", "engine": "Atomic"}));
        let statement = create_database_query(&db, Some("my_cluster")).unwrap();
        assert_eq!(
            statement.sql,
            "CREATE DATABASE test_db ON CLUSTER my_cluster ENGINE = Atomic"
        );
    }

    #[test]
    fn test_create_database_with_engine_settings() {
        let db = database(json!({
            "db_name": "test_2",
            "engine": "PostgreSQL",
            "engine_settings": {
                "host:port": "158.160.17.193:5432",
                "database": "pg_test_db",
                "user": "pgadmin",
                "password": "4r5t6y7u",
            }
        }));
        let statement = create_database_query(&db, None).unwrap();
        assert_eq!(
            statement.sql,
            "CREATE DATABASE test_2 ENGINE = PostgreSQL ('158.160.17.193:5432', 'pg_test_db', 'pgadmin', '4r5t6y7u')"
        );
        assert_eq!(
            statement.display,
            "CREATE DATABASE test_2 ENGINE = PostgreSQL ('158.160.17.193:5432', 'pg_test_db', 'pgadmin', '******')"
        );
    }

    #[test]
    fn test_engine_settings_without_engine() {
        let db = database(json!({"name": "d", "engine_settings": {"a": "b"}}));
        assert!(create_database_query(&db, None).is_err());
    }

    #[test]
    fn test_drop_queries() {
        assert_eq!(
            drop_query(ResourceKind::Database, "test_db", None).unwrap().sql,
            "DROP DATABASE IF EXISTS test_db"
        );
        assert_eq!(
            drop_query(ResourceKind::NamedCollection, "pg", Some("c1"))
                .unwrap()
                .sql,
            "DROP NAMED COLLECTION IF EXISTS pg ON CLUSTER c1"
        );
        assert_eq!(
            drop_query(ResourceKind::User, "user1", Some("my_cluster"))
                .unwrap()
                .sql,
            "DROP USER IF EXISTS user1 ON CLUSTER my_cluster"
        );
        assert!(drop_query(ResourceKind::Grant, "x", None).is_err());
        assert!(drop_query(ResourceKind::Role, "x'; --", None).is_err());
    }

    #[test]
    fn test_existence_query() {
        assert_eq!(
            existence_query(ResourceKind::Role).unwrap(),
            "SELECT count(*) FROM system.roles WHERE name = ?"
        );
        assert!(existence_query(ResourceKind::Grant).is_err());
    }

    #[test]
    fn test_named_collection_create_and_alter() {
        let collection: NamedCollection = serde_json::from_value(json!({
            "collection": "test_collection",
            "pg_user": "bi_reader",
            "pg_pswd": "1111",
            "pg_host": "10.129.0.36",
            "pg_port": 5433,
            "pg_db": "test",
        }))
        .unwrap();

        let create = named_collection_query(&collection, Some("my_cluster"), false).unwrap();
        assert_eq!(
            create.sql,
            "CREATE NAMED COLLECTION test_collection ON CLUSTER my_cluster AS user = 'bi_reader', password = '1111', host = '10.129.0.36', port = 5433, database = 'test'"
        );
        assert!(create.display.contains("password = '******'"));

        let alter = named_collection_query(&collection, None, true).unwrap();
        assert!(alter
            .sql
            .starts_with("ALTER NAMED COLLECTION test_collection SET user = 'bi_reader'"));
    }

    #[test]
    fn test_named_collection_schema_and_required_fields() {
        let mut collection: NamedCollection = serde_json::from_value(json!({
            "name": "c",
            "pg_user": "u",
            "pg_host": "h",
            "pg_db": "d",
            "pg_schema": "public",
        }))
        .unwrap();
        let statement = named_collection_query(&collection, None, false).unwrap();
        assert!(statement.sql.ends_with("database = 'd', schema = 'public'"));
        assert!(statement.sql.contains("password = ''"));

        collection.pg_host = None;
        let err = named_collection_query(&collection, None, false).unwrap_err();
        assert!(err.to_string().contains("pg_host"));
    }

    #[test]
    fn test_create_role_with_settings() {
        let role: Role = serde_json::from_value(json!({
            "name": "test_role",
            "settings": {"readonly": 1, "insert_allow_materialized_columns": "0"},
        }))
        .unwrap();
        assert_eq!(
            create_role_query(&role, Some("my_cluster")).unwrap().sql,
            "CREATE ROLE IF NOT EXISTS test_role ON CLUSTER my_cluster SETTINGS readonly=1 READONLY, insert_allow_materialized_columns=0 READONLY"
        );
    }

    #[test]
    fn test_settings_clause_quotes_strings() {
        let mut settings = SettingsMap::new();
        settings.insert("load_balancing".to_string(), json!("random"));
        settings.insert("use_uncompressed_cache".to_string(), json!(true));
        assert_eq!(
            settings_clause(&settings).unwrap(),
            "load_balancing='random' READONLY, use_uncompressed_cache=1 READONLY"
        );

        settings.insert("bad".to_string(), json!(["x"]));
        assert!(settings_clause(&settings).is_err());
    }

    #[test]
    fn test_settings_clause_quotes_non_finite_strings() {
        let mut settings = SettingsMap::new();
        settings.insert("max_threads".to_string(), json!(" 8 "));
        settings.insert("a".to_string(), json!("nan"));
        settings.insert("b".to_string(), json!("inf"));
        settings.insert("c".to_string(), json!("-Infinity"));
        assert_eq!(
            settings_clause(&settings).unwrap(),
            "max_threads=8 READONLY, a='nan' READONLY, b='inf' READONLY, c='-Infinity' READONLY"
        );
    }

    #[test]
    fn test_create_user_full() {
        let u = user(json!({
            "name": "user1",
            "auth_type": "sha256_password",
            "auth": "qwerty",
            "roles": "ALL",
            "database": "test_db",
            "grantees": "ANY",
            "settings": {"readonly": 1},
        }));
        let statement = user_query(&u, Some("my_cluster"), false).unwrap();
        assert_eq!(
            statement.sql,
            "CREATE USER user1 ON CLUSTER my_cluster IDENTIFIED WITH sha256_password BY 'qwerty' DEFAULT ROLE ALL DEFAULT DATABASE test_db GRANTEES ANY SETTINGS readonly=1 READONLY"
        );
        assert_eq!(
            statement.display,
            "CREATE USER user1 ON CLUSTER my_cluster IDENTIFIED WITH sha256_password BY '******' DEFAULT ROLE ALL DEFAULT DATABASE test_db GRANTEES ANY SETTINGS readonly=1 READONLY"
        );
    }

    #[test]
    fn test_alter_user_lists() {
        let u = user(json!({
            "name": "user2",
            "grantees": ["user1", "user3"],
            "roles": ["test_role", "test_role_1"],
        }));
        assert_eq!(
            user_query(&u, None, true).unwrap().sql,
            "ALTER USER user2 DEFAULT ROLE test_role,test_role_1 GRANTEES user1,user3"
        );
    }

    #[test]
    fn test_user_password_is_escaped() {
        let u = user(json!({"name": "u", "auth": "it's"}));
        let statement = user_query(&u, None, false).unwrap();
        assert_eq!(
            statement.sql,
            "CREATE USER u IDENTIFIED WITH sha256_password BY 'it\\'s'"
        );
        assert!(!statement.display.contains("it"));
    }

    #[test]
    fn test_user_auth_consistency() {
        let mut u = user(json!({"name": "u", "auth_type": "no_password"}));
        assert_eq!(
            user_query(&u, None, false).unwrap().sql,
            "CREATE USER u IDENTIFIED WITH no_password"
        );

        u.auth = Some("x".to_string());
        assert!(user_query(&u, None, false).is_err());

        u.auth = None;
        u.auth_type = Some(AuthType::DoubleSha1Hash);
        assert!(user_query(&u, None, false).is_err());
    }

    #[test]
    fn test_user_allowed_hosts() {
        let u = user(json!({
            "name": "u",
            "allowed_hosts": ["10.0.0.0/8", "192.168.1.5", "db.example.com", "local"],
        }));
        assert_eq!(
            user_query(&u, None, false).unwrap().sql,
            "CREATE USER u HOST IP '10.0.0.0/8', IP '192.168.1.5', NAME 'db.example.com', LOCAL"
        );

        assert_eq!(hosts_clause(&["any".to_string()]).unwrap(), "ANY");
        assert!(hosts_clause(&["ANY".to_string(), "10.0.0.1".to_string()]).is_err());
        assert!(hosts_clause(&["evil'host".to_string()]).is_err());
    }

    #[test]
    fn test_user_rejects_bad_role_names() {
        let u = user(json!({"name": "u", "roles": ["ok", "bad;role"]}));
        assert!(matches!(
            user_query(&u, None, false),
            Err(ClickhouseError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_replace_only_on_first_grant() {
        let g = grant(json!({
            "role": "test_role, test_role_1, user1",
            "privs": {
                "test_db.*": "SELECT,UPDATE,ALTER,ACCESS MANAGEMENT",
                "*.*": "SHOW USERS",
                "logs.events": "INSERT",
            },
            "replace": true,
        }));
        let statements = grant_privileges_queries(&g, &g.privs, Some("my_cluster")).unwrap();
        let sql: Vec<&str> = statements.iter().map(|s| s.sql.as_str()).collect();
        assert_eq!(
            sql,
            vec![
                "GRANT ON CLUSTER my_cluster SELECT,UPDATE,ALTER,ACCESS MANAGEMENT ON test_db.* TO test_role,test_role_1,user1 WITH REPLACE OPTION",
                "GRANT ON CLUSTER my_cluster SHOW USERS ON *.* TO test_role,test_role_1,user1",
                "GRANT ON CLUSTER my_cluster INSERT ON logs.events TO test_role,test_role_1,user1",
            ]
        );
    }

    #[test]
    fn test_grant_option_on_every_statement() {
        let g = grant(json!({
            "role": "r",
            "privs": {"a.*": "SELECT", "b.*": "SELECT"},
            "grant": true,
        }));
        let statements = grant_privileges_queries(&g, &g.privs, None).unwrap();
        assert!(statements
            .iter()
            .all(|s| s.sql.ends_with("WITH GRANT OPTION")));
    }

    #[test]
    fn test_revoke_privileges() {
        let g = grant(json!({"role": "r1,r2", "privs": {"test_db.*": "SELECT"}}));
        let statements = revoke_privileges_queries(&g, &g.privs, Some("c")).unwrap();
        assert_eq!(
            statements[0].sql,
            "REVOKE ON CLUSTER c SELECT ON test_db.* FROM r1,r2"
        );
    }

    #[test]
    fn test_column_level_grant_and_revoke() {
        let g = grant(json!({"role": "analyst", "privs": {"db.t": "SELECT(id, name), INSERT"}}));
        let granted = grant_privileges_queries(&g, &g.privs, None).unwrap();
        assert_eq!(
            granted[0].sql,
            "GRANT SELECT(id, name),INSERT ON db.t TO analyst"
        );
        let revoked = revoke_privileges_queries(&g, &g.privs, None).unwrap();
        assert_eq!(
            revoked[0].sql,
            "REVOKE SELECT(id, name),INSERT ON db.t FROM analyst"
        );
    }

    #[test]
    fn test_grant_rejects_injected_privileges() {
        let g = grant(json!({"role": "r", "privs": {"db.*": "SELECT; DROP DATABASE db"}}));
        assert!(grant_privileges_queries(&g, &g.privs, None).is_err());
    }

    #[test]
    fn test_grant_and_revoke_roles() {
        let g = grant(json!({
            "role": ["test_role", "test_role_1"],
            "grant_to": "user1",
            "admin": true,
            "replace": true,
        }));
        assert_eq!(
            grant_roles_query(&g, &g.grant_to, Some("my_cluster"))
                .unwrap()
                .sql,
            "GRANT ON CLUSTER my_cluster test_role,test_role_1 TO user1 WITH ADMIN OPTION WITH REPLACE OPTION"
        );
        assert_eq!(
            revoke_roles_query(&g, &g.grant_to, Some("my_cluster"))
                .unwrap()
                .sql,
            "REVOKE ADMIN OPTION FOR test_role,test_role_1 FROM user1 ON CLUSTER my_cluster"
        );

        let plain = grant(json!({"role": "test_role", "grant_to": "user1"}));
        assert_eq!(
            revoke_roles_query(&plain, &plain.grant_to, None).unwrap().sql,
            "REVOKE test_role FROM user1"
        );
    }
}
