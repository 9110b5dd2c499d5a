use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utilities::json::{
    deserialize_optional_string, deserialize_settings, deserialize_string_list, SettingsMap,
};

/// Authentication methods accepted after `IDENTIFIED WITH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[value(name = "no_password")]
    NoPassword,
    #[value(name = "plaintext_password")]
    PlaintextPassword,
    #[value(name = "sha256_password")]
    Sha256Password,
    #[value(name = "sha256_hash")]
    Sha256Hash,
    #[value(name = "double_sha1_password")]
    DoubleSha1Password,
    #[value(name = "double_sha1_hash")]
    DoubleSha1Hash,
}

impl AuthType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AuthType::NoPassword => "no_password",
            AuthType::PlaintextPassword => "plaintext_password",
            AuthType::Sha256Password => "sha256_password",
            AuthType::Sha256Hash => "sha256_hash",
            AuthType::DoubleSha1Password => "double_sha1_password",
            AuthType::DoubleSha1Hash => "double_sha1_hash",
        }
    }

    pub fn requires_secret(&self) -> bool {
        !matches!(self, AuthType::NoPassword)
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A ClickHouse user.
///
/// Every run against an existing user re-issues the full definition through
/// `ALTER USER`, so drift in any of these attributes is corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "user")]
    pub name: String,

    #[serde(default)]
    pub auth_type: Option<AuthType>,

    /// Password or hash matching `auth_type`
    #[serde(
        default,
        alias = "pswd",
        alias = "hash",
        deserialize_with = "deserialize_optional_string"
    )]
    pub auth: Option<String>,

    /// Hosts or subnets (`10.0.0.0/8`) the user may connect from. Any host when empty.
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub allowed_hosts: Vec<String>,

    /// Default roles, `ALL` and `NONE` included
    #[serde(default, alias = "role", deserialize_with = "deserialize_string_list")]
    pub roles: Vec<String>,

    /// Default database
    #[serde(
        default,
        alias = "db",
        alias = "default_db",
        deserialize_with = "deserialize_optional_string"
    )]
    pub database: Option<String>,

    /// Users or roles allowed to receive grants from this user, `ANY` included
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub grantees: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_settings")]
    pub settings: SettingsMap,
}

impl User {
    /// Authentication method actually emitted.
    ///
    /// A secret without an explicit method uses `sha256_password`.
    pub fn effective_auth_type(&self) -> Option<AuthType> {
        match (self.auth_type, &self.auth) {
            (Some(auth_type), _) => Some(auth_type),
            (None, Some(_)) => Some(AuthType::Sha256Password),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_from_record() {
        let user: User = serde_json::from_value(json!({
            "user": "user2",
            "auth_type": "double_sha1_hash",
            "hash": "abc",
            "grantees": ["user1", "user3"],
            "role": ["test_role", "test_role_1"],
            "default_db": "test_db",
        }))
        .unwrap();

        assert_eq!(user.name, "user2");
        assert_eq!(user.auth_type, Some(AuthType::DoubleSha1Hash));
        assert_eq!(user.auth.as_deref(), Some("abc"));
        assert_eq!(user.roles, vec!["test_role", "test_role_1"]);
        assert_eq!(user.grantees, vec!["user1", "user3"]);
        assert_eq!(user.database.as_deref(), Some("test_db"));
        assert!(user.allowed_hosts.is_empty());
    }

    #[test]
    fn test_effective_auth_type() {
        let mut user: User = serde_json::from_value(json!({"name": "u", "pswd": "x"})).unwrap();
        assert_eq!(user.effective_auth_type(), Some(AuthType::Sha256Password));

        user.auth = None;
        assert_eq!(user.effective_auth_type(), None);

        user.auth_type = Some(AuthType::NoPassword);
        assert_eq!(user.effective_auth_type(), Some(AuthType::NoPassword));
        assert!(!AuthType::NoPassword.requires_secret());
    }

    #[test]
    fn test_unknown_auth_type_is_rejected() {
        assert!(serde_json::from_value::<User>(json!({"name": "u", "auth_type": "ldap"})).is_err());
    }
}
