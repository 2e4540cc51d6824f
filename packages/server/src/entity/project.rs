use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::activity::Activity;
use super::address::Address;
use super::trackable::{Trackable, TrackableKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i32,
    pub title: String,
    pub summary: Option<String>,
    /// Default visibility for list queries resolved under the public scope.
    pub is_public: bool,
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

impl Trackable for Project {
    const KIND: TrackableKind = TrackableKind::Project;
    const HAS_TEAM: bool = true;

    fn id(&self) -> i32 {
        self.id
    }

    fn creator_id(&self) -> i32 {
        self.creator_id
    }
}
