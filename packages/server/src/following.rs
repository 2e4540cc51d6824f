use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::entity::{Following, Trackable, User};
use crate::error::AppError;
use crate::repo::{FollowingStore, UserStore};

/// Relationship state reported back after a follow/assign mutation or query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FollowingState {
    pub is_following: bool,
    pub is_assigning: bool,
    /// Whether a record existed for the pair before the operation. Lets the
    /// façade distinguish "cleared" from "was never there".
    pub existed: bool,
}

/// Manages the (entity, follower) relationship state and its lifecycle.
///
/// All operations use explicit-set semantics: re-invoking `follow` on an
/// already-following pair is a no-op, safe under retries. A record whose two
/// flags both end up false is deleted, never persisted.
pub struct FollowingEngine {
    followings: Arc<dyn FollowingStore>,
    users: Arc<dyn UserStore>,
}

impl FollowingEngine {
    pub fn new(followings: Arc<dyn FollowingStore>, users: Arc<dyn UserStore>) -> Self {
        Self { followings, users }
    }

    async fn load<T: Trackable>(
        &self,
        entity: &T,
        user_id: i32,
    ) -> Result<(Following, bool), AppError> {
        match self.followings.find((T::KIND, entity.id(), user_id)).await? {
            Some(record) => Ok((record, true)),
            None => Ok((Following::base(entity, user_id), false)),
        }
    }

    /// Persist the record, or delete it when both flags ended up false.
    async fn commit(&self, record: Following, existed: bool) -> Result<FollowingState, AppError> {
        let state = FollowingState {
            is_following: record.is_following,
            is_assigning: record.is_assigning,
            existed,
        };
        if record.is_void() {
            if existed {
                self.followings.delete(record.key()).await?;
            }
            return Ok(state);
        }
        self.followings.save(record).await?;
        Ok(state)
    }

    #[instrument(skip(self, entity), fields(kind = ?T::KIND, entity_id = entity.id(), user_id))]
    pub async fn follow<T: Trackable>(
        &self,
        entity: &T,
        user_id: i32,
    ) -> Result<FollowingState, AppError> {
        let (mut record, existed) = self.load(entity, user_id).await?;
        if record.is_following {
            return Ok(FollowingState {
                is_following: true,
                is_assigning: record.is_assigning,
                existed,
            });
        }
        record.is_following = true;
        self.commit(record, existed).await
    }

    #[instrument(skip(self, entity), fields(kind = ?T::KIND, entity_id = entity.id(), user_id))]
    pub async fn unfollow<T: Trackable>(
        &self,
        entity: &T,
        user_id: i32,
    ) -> Result<FollowingState, AppError> {
        let (mut record, existed) = self.load(entity, user_id).await?;
        if !existed {
            return Ok(FollowingState {
                is_following: false,
                is_assigning: false,
                existed: false,
            });
        }
        record.is_following = false;
        self.commit(record, existed).await
    }

    #[instrument(skip(self, entity), fields(kind = ?T::KIND, entity_id = entity.id(), user_id))]
    pub async fn assign<T: Trackable>(
        &self,
        entity: &T,
        user_id: i32,
    ) -> Result<FollowingState, AppError> {
        let (mut record, existed) = self.load(entity, user_id).await?;
        if !T::HAS_TEAM {
            // No team concept: report false, never an error, write nothing.
            return Ok(FollowingState {
                is_following: record.is_following,
                is_assigning: false,
                existed,
            });
        }
        if record.is_assigning {
            return Ok(FollowingState {
                is_following: record.is_following,
                is_assigning: true,
                existed,
            });
        }
        record.is_assigning = true;
        self.commit(record, existed).await
    }

    #[instrument(skip(self, entity), fields(kind = ?T::KIND, entity_id = entity.id(), user_id))]
    pub async fn unassign<T: Trackable>(
        &self,
        entity: &T,
        user_id: i32,
    ) -> Result<FollowingState, AppError> {
        let (mut record, existed) = self.load(entity, user_id).await?;
        if !existed {
            return Ok(FollowingState {
                is_following: false,
                is_assigning: false,
                existed: false,
            });
        }
        record.is_assigning = false;
        self.commit(record, existed).await
    }

    /// True iff the user is the entity's creator or holds an explicit
    /// `is_assigning = true` record. The creator is implicitly assigned no
    /// matter what following records say.
    pub async fn is_assigned<T: Trackable>(
        &self,
        entity: &T,
        user_id: i32,
    ) -> Result<bool, AppError> {
        if entity.creator_id() == user_id {
            return Ok(true);
        }
        let record = self.followings.find((T::KIND, entity.id(), user_id)).await?;
        Ok(record.is_some_and(|r| r.is_assigning))
    }

    /// True iff an explicit `is_following = true` record exists. Creating an
    /// entity does not imply following it.
    pub async fn is_followed<T: Trackable>(
        &self,
        entity: &T,
        user_id: i32,
    ) -> Result<bool, AppError> {
        let record = self.followings.find((T::KIND, entity.id(), user_id)).await?;
        Ok(record.is_some_and(|r| r.is_following))
    }

    /// The entity's team: creator first, then explicit assigners, each user
    /// exactly once even when the creator also holds an explicit record.
    pub async fn team<T: Trackable>(&self, entity: &T) -> Result<Vec<User>, AppError> {
        let mut members = Vec::new();
        let mut seen = std::collections::HashSet::new();

        if let Some(creator) = self.users.find_by_id(entity.creator_id()).await? {
            seen.insert(creator.id);
            members.push(creator);
        } else {
            tracing::warn!(
                creator_id = entity.creator_id(),
                "Trackable entity has a dangling creator reference"
            );
        }

        for record in self
            .followings
            .find_for_entity(T::KIND, entity.id())
            .await?
        {
            if !record.is_assigning || !seen.insert(record.user_id) {
                continue;
            }
            match self.users.find_by_id(record.user_id).await? {
                Some(user) => members.push(user),
                None => tracing::warn!(
                    user_id = record.user_id,
                    "Following record references a missing user"
                ),
            }
        }

        Ok(members)
    }

    /// All records with `is_following = true` for the entity.
    pub async fn followers<T: Trackable>(&self, entity: &T) -> Result<Vec<Following>, AppError> {
        let records = self
            .followings
            .find_for_entity(T::KIND, entity.id())
            .await?;
        Ok(records.into_iter().filter(|r| r.is_following).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::entity::{Project, Role, TrackableKind};
    use crate::repo::memory::InMemoryBackend;

    fn engine() -> (Arc<InMemoryBackend>, FollowingEngine) {
        let backend = Arc::new(InMemoryBackend::new());
        let engine = FollowingEngine::new(backend.clone(), backend.clone());
        (backend, engine)
    }

    async fn seed_user(backend: &InMemoryBackend, id: i32, name: &str) -> User {
        UserStore::save(
            backend,
            User {
                id,
                username: name.into(),
                role: Role::User,
                disabled: false,
                address: None,
                picture: None,
                picture_file: None,
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap()
    }

    async fn seed_project(backend: &InMemoryBackend, creator_id: i32) -> Project {
        crate::repo::TrackableStore::save(
            backend,
            Project {
                id: 0,
                title: "garden".into(),
                summary: None,
                is_public: true,
                creator_id,
                address: None,
                picture: None,
                picture_file: None,
                activities: Vec::new(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn follow_is_idempotent() {
        let (backend, engine) = engine();
        seed_user(&backend, 1, "creator").await;
        seed_user(&backend, 2, "fan").await;
        let project = seed_project(&backend, 1).await;

        let first = engine.follow(&project, 2).await.unwrap();
        assert!(first.is_following);
        assert!(!first.existed);

        let second = engine.follow(&project, 2).await.unwrap();
        assert!(second.is_following);
        assert!(second.existed);
    }

    #[tokio::test]
    async fn unfollow_deletes_void_record() {
        let (backend, engine) = engine();
        seed_user(&backend, 1, "creator").await;
        seed_user(&backend, 2, "fan").await;
        let project = seed_project(&backend, 1).await;

        engine.follow(&project, 2).await.unwrap();
        engine.unfollow(&project, 2).await.unwrap();

        let record = backend
            .find((TrackableKind::Project, project.id, 2))
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn unfollow_keeps_assignment() {
        let (backend, engine) = engine();
        seed_user(&backend, 1, "creator").await;
        seed_user(&backend, 2, "member").await;
        let project = seed_project(&backend, 1).await;

        engine.follow(&project, 2).await.unwrap();
        engine.assign(&project, 2).await.unwrap();
        let state = engine.unfollow(&project, 2).await.unwrap();

        assert!(!state.is_following);
        assert!(state.is_assigning);
        assert!(engine.is_assigned(&project, 2).await.unwrap());
    }

    #[tokio::test]
    async fn unfollow_of_absent_pair_is_a_noop() {
        let (backend, engine) = engine();
        seed_user(&backend, 1, "creator").await;
        let project = seed_project(&backend, 1).await;

        let state = engine.unfollow(&project, 42).await.unwrap();
        assert!(!state.existed);
        assert!(!state.is_following);
    }

    #[tokio::test]
    async fn creator_is_implicitly_assigned_but_not_following() {
        let (backend, engine) = engine();
        seed_user(&backend, 1, "creator").await;
        let project = seed_project(&backend, 1).await;

        assert!(engine.is_assigned(&project, 1).await.unwrap());
        assert!(!engine.is_followed(&project, 1).await.unwrap());
    }

    #[tokio::test]
    async fn team_lists_creator_first_without_duplicates() {
        let (backend, engine) = engine();
        seed_user(&backend, 1, "creator").await;
        seed_user(&backend, 2, "member").await;
        let project = seed_project(&backend, 1).await;

        // The creator also assigns themselves explicitly.
        engine.assign(&project, 1).await.unwrap();
        engine.assign(&project, 2).await.unwrap();

        let team = engine.team(&project).await.unwrap();
        let ids: Vec<i32> = team.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn followers_excludes_pure_assigners() {
        let (backend, engine) = engine();
        seed_user(&backend, 1, "creator").await;
        seed_user(&backend, 2, "member").await;
        seed_user(&backend, 3, "fan").await;
        let project = seed_project(&backend, 1).await;

        engine.assign(&project, 2).await.unwrap();
        engine.follow(&project, 3).await.unwrap();

        let followers = engine.followers(&project).await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].user_id, 3);
    }
}
