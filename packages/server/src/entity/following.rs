use serde::{Deserialize, Serialize};

use super::trackable::{Trackable, TrackableKind};

/// Composite identity of a following record: (entity kind, entity id, user id).
pub type FollowingKey = (TrackableKind, i32, i32);

/// Join record between one trackable entity and one user, carrying
/// independent follow and assignment state.
///
/// A record with both flags false is logically deleted and must never
/// persist; it exists only as a transient carrier while flags are computed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Following {
    pub entity_kind: TrackableKind,
    pub entity_id: i32,
    pub user_id: i32,
    pub is_following: bool,
    pub is_assigning: bool,
    /// Optimistic concurrency counter, bumped on every save. Two users
    /// toggling their own records never conflict; the same user racing
    /// itself does.
    pub version: u32,
}

impl Following {
    /// Transient base record with both flags unset.
    pub fn base<T: Trackable>(entity: &T, user_id: i32) -> Self {
        Self {
            entity_kind: T::KIND,
            entity_id: entity.id(),
            user_id,
            is_following: false,
            is_assigning: false,
            version: 0,
        }
    }

    pub fn key(&self) -> FollowingKey {
        (self.entity_kind, self.entity_id, self.user_id)
    }

    /// True when both flags are unset and the record must not persist.
    pub fn is_void(&self) -> bool {
        !self.is_following && !self.is_assigning
    }
}
