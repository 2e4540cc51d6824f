use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::activity::Activity;
use super::address::Address;
use super::trackable::{Trackable, TrackableKind};

/// Organizations carry no `is_public` flag: they are always enumerable, but
/// their nested activities are still filtered per-activity. The membership
/// set is the team (creator plus explicit assigners).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i32,
    pub name: String,
    pub summary: Option<String>,
    pub creator_id: i32,
    pub address: Option<Address>,
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub picture_file: Option<String>,
    /// Child activities, filled by the visibility resolver. Stored copies
    /// keep this empty.
    #[serde(default)]
    pub activities: Vec<Activity>,
    pub created_at: DateTime<Utc>,
}

impl Trackable for Organization {
    const KIND: TrackableKind = TrackableKind::Organization;
    const HAS_TEAM: bool = true;

    fn id(&self) -> i32 {
        self.id
    }

    fn creator_id(&self) -> i32 {
        self.creator_id
    }
}
