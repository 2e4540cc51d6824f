use serde::{Deserialize, Serialize};

/// Exclusive owner of an address. An address belongs to exactly one user or
/// one organization, never both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "owner_type", content = "owner_id", rename_all = "snake_case")]
pub enum AddressOwner {
    User(i32),
    Organization(i32),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
    pub owner: AddressOwner,
}
