use serde::{Deserialize, Serialize};

/// Entity families that can accumulate followers and assignees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackableKind {
    Project,
    Organization,
}

impl TrackableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackableKind::Project => "project",
            TrackableKind::Organization => "organization",
        }
    }
}

/// Capability trait for entities that carry follower/assignee state.
///
/// The creator is the implicit, non-removable assignee; assignment queries
/// union it with explicit assigners and must never double-count.
pub trait Trackable {
    const KIND: TrackableKind;
    /// Whether this entity family has a team concept. Assignment on a
    /// teamless family is a no-op reporting false, never an error.
    const HAS_TEAM: bool;

    fn id(&self) -> i32;
    fn creator_id(&self) -> i32;
}
