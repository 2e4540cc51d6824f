pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::entity::{Activity, Following, FollowingKey, Trackable, User};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Stale write: expected version {expected}, found {found}")]
    VersionConflict { expected: u32, found: u32 },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Scope-specific selection over a trackable entity family.
///
/// Selection is always pushed to the store (a database implementation would
/// express these as joins); only nested per-activity filtering happens in
/// memory afterwards.
#[async_trait]
pub trait TrackableStore<T: Trackable>: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<T>, RepoError>;

    async fn find_all(&self) -> Result<Vec<T>, RepoError>;

    async fn find_by_creator(&self, user_id: i32) -> Result<Vec<T>, RepoError>;

    /// Entities joined to a following record with `is_assigning = true` for
    /// the given user. Creator-owned entities are NOT included here; the
    /// resolver unions them in so they are never double-counted.
    async fn find_assigned(&self, user_id: i32) -> Result<Vec<T>, RepoError>;

    /// Entities joined to a following record with `is_following = true` for
    /// the given user.
    async fn find_followed(&self, user_id: i32) -> Result<Vec<T>, RepoError>;

    /// Insert or replace. An id of 0 allocates a fresh id; the saved entity
    /// is returned.
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    async fn delete(&self, id: i32) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Activity>, RepoError>;

    async fn find_all(&self) -> Result<Vec<Activity>, RepoError>;

    async fn find_public(&self) -> Result<Vec<Activity>, RepoError>;

    async fn find_by_creator(&self, user_id: i32) -> Result<Vec<Activity>, RepoError>;

    async fn find_for_project(&self, project_id: i32) -> Result<Vec<Activity>, RepoError>;

    async fn find_for_organization(&self, organization_id: i32)
    -> Result<Vec<Activity>, RepoError>;

    /// Insert or replace. An id of 0 allocates a fresh id; the saved entity
    /// is returned.
    async fn save(&self, activity: Activity) -> Result<Activity, RepoError>;

    async fn delete(&self, id: i32) -> Result<bool, RepoError>;
}

/// Following records addressed by (entity kind, entity id, user id).
#[async_trait]
pub trait FollowingStore: Send + Sync {
    async fn find(&self, key: FollowingKey) -> Result<Option<Following>, RepoError>;

    async fn find_for_entity(
        &self,
        kind: crate::entity::TrackableKind,
        entity_id: i32,
    ) -> Result<Vec<Following>, RepoError>;

    /// Optimistic save: fails with [`RepoError::VersionConflict`] when the
    /// stored version differs from the one being written, and refuses to
    /// persist a record with both flags false.
    async fn save(&self, following: Following) -> Result<Following, RepoError>;

    async fn delete(&self, key: FollowingKey) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepoError>;

    async fn find_all(&self) -> Result<Vec<User>, RepoError>;

    async fn save(&self, user: User) -> Result<User, RepoError>;
}
