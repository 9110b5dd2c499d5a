use serde::{Deserialize, Serialize};

use crate::utilities::json::{deserialize_settings, SettingsMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(alias = "role")]
    pub name: String,

    /// Settings constraints applied as `name=value READONLY`
    #[serde(default, deserialize_with = "deserialize_settings")]
    pub settings: SettingsMap,
}
