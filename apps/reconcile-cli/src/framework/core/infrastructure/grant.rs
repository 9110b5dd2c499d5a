use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::infrastructure::olap::clickhouse::errors::ClickhouseError;
use crate::utilities::json::{deserialize_string_list, scalar_to_string};

/// Privileges granted on one object, e.g. `test_db.*` -> `SELECT, INSERT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivilegeEntry {
    pub object: String,
    pub privileges: Vec<String>,
}

impl PrivilegeEntry {
    pub fn new(object: impl Into<String>, privileges: &str) -> Self {
        Self {
            object: object.into().trim().to_string(),
            privileges: split_privileges([privileges]),
        }
    }
}

/// Splits privilege lists on commas outside parentheses, so column lists such as
/// `SELECT(id, name)` stay whole.
pub fn split_privileges<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut privileges = Vec::new();
    for item in items {
        let mut depth = 0usize;
        let mut current = String::new();
        for c in item.as_ref().chars() {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    privileges.push(std::mem::take(&mut current));
                    continue;
                }
                _ => {}
            }
            current.push(c);
        }
        privileges.push(current);
    }
    privileges
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Privileges or roles granted to a list of roles and users.
///
/// Exactly one of `privs` and `grant_to` must be given: `privs` grants privileges to
/// `roles`, `grant_to` grants the `roles` themselves to other users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    /// Roles or users; both can be combined in one list
    #[serde(
        rename = "role",
        alias = "roles",
        alias = "user",
        deserialize_with = "deserialize_string_list"
    )]
    pub roles: Vec<String>,

    /// Users receiving the roles listed in `role`
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub grant_to: Vec<String>,

    /// Object -> privileges, applied in the given order
    #[serde(default, deserialize_with = "deserialize_privileges")]
    pub privs: Vec<PrivilegeEntry>,

    /// Replace all existing privileges or roles instead of adding to them
    #[serde(default)]
    pub replace: bool,

    /// `WITH GRANT OPTION`, only used when granting privileges
    #[serde(default)]
    pub grant: bool,

    /// `WITH ADMIN OPTION` / `ADMIN OPTION FOR`, only used with `grant_to`
    #[serde(default)]
    pub admin: bool,
}

/// What a grant hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantTarget<'a> {
    Privileges(&'a [PrivilegeEntry]),
    Roles(&'a [String]),
}

impl Grant {
    pub fn target(&self) -> Result<GrantTarget<'_>, ClickhouseError> {
        match (self.privs.is_empty(), self.grant_to.is_empty()) {
            (false, true) => Ok(GrantTarget::Privileges(&self.privs)),
            (true, false) => Ok(GrantTarget::Roles(&self.grant_to)),
            (true, true) => Err(ClickhouseError::invalid_parameters(
                "'privs' or 'grant_to' parameter is required",
            )),
            (false, false) => Err(ClickhouseError::invalid_parameters(
                "'privs' and 'grant_to' are mutually exclusive",
            )),
        }
    }
}

/// Accepts `null` or an object whose values are privilege strings or lists.
fn deserialize_privileges<'de, D>(deserializer: D) -> Result<Vec<PrivilegeEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) => Ok(map
            .into_iter()
            .map(|(object, privileges)| {
                let privileges = match privileges {
                    Value::Array(items) => split_privileges(items.iter().map(scalar_to_string)),
                    other => split_privileges([scalar_to_string(&other)]),
                };
                PrivilegeEntry {
                    object: object.trim().to_string(),
                    privileges,
                }
            })
            .collect()),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a mapping of object to privileges, got {other}"
        ))),
    }
}
