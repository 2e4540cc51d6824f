use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::address::Address;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub role: Role,
    /// Disabled accounts keep their data but lose admin standing.
    pub disabled: bool,
    pub address: Option<Address>,
    /// Stored picture artifact name, if any.
    pub picture: Option<String>,
    /// Base64 picture payload filled at read time, never persisted.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub picture_file: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin && !self.disabled
    }
}
