use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::entity::{Activity, Following, FollowingKey, Organization, Project, TrackableKind, User};

use super::{ActivityStore, FollowingStore, RepoError, TrackableStore, UserStore};

/// In-memory persistence backend over concurrent maps.
///
/// Backs the test suites and small single-process deployments; a database
/// implementation of the same traits is an external collaborator.
#[derive(Default)]
pub struct InMemoryBackend {
    users: DashMap<i32, User>,
    projects: DashMap<i32, Project>,
    organizations: DashMap<i32, Organization>,
    activities: DashMap<i32, Activity>,
    followings: DashMap<FollowingKey, Following>,
    next_user_id: AtomicI32,
    next_project_id: AtomicI32,
    next_organization_id: AtomicI32,
    next_activity_id: AtomicI32,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(counter: &AtomicI32, requested: i32) -> i32 {
        if requested == 0 {
            return counter.fetch_add(1, Ordering::SeqCst) + 1;
        }
        // Keep the counter ahead of explicitly chosen ids.
        counter.fetch_max(requested, Ordering::SeqCst);
        requested
    }

    fn sorted_by_id<T>(mut items: Vec<T>, id_of: impl Fn(&T) -> i32) -> Vec<T> {
        items.sort_by_key(|item| id_of(item));
        items
    }

    fn tracked_ids(&self, kind: TrackableKind, user_id: i32, assigning: bool) -> Vec<i32> {
        self.followings
            .iter()
            .filter(|entry| {
                let f = entry.value();
                f.entity_kind == kind
                    && f.user_id == user_id
                    && if assigning {
                        f.is_assigning
                    } else {
                        f.is_following
                    }
            })
            .map(|entry| entry.value().entity_id)
            .collect()
    }
}

macro_rules! impl_trackable_store {
    ($entity:ty, $map:ident, $counter:ident, $kind:expr) => {
        #[async_trait]
        impl TrackableStore<$entity> for InMemoryBackend {
            async fn find_by_id(&self, id: i32) -> Result<Option<$entity>, RepoError> {
                Ok(self.$map.get(&id).map(|e| e.value().clone()))
            }

            async fn find_all(&self) -> Result<Vec<$entity>, RepoError> {
                let items = self.$map.iter().map(|e| e.value().clone()).collect();
                Ok(Self::sorted_by_id(items, |e: &$entity| e.id))
            }

            async fn find_by_creator(&self, user_id: i32) -> Result<Vec<$entity>, RepoError> {
                let items = self
                    .$map
                    .iter()
                    .filter(|e| e.value().creator_id == user_id)
                    .map(|e| e.value().clone())
                    .collect();
                Ok(Self::sorted_by_id(items, |e: &$entity| e.id))
            }

            async fn find_assigned(&self, user_id: i32) -> Result<Vec<$entity>, RepoError> {
                let ids = self.tracked_ids($kind, user_id, true);
                let items = ids
                    .into_iter()
                    .filter_map(|id| self.$map.get(&id).map(|e| e.value().clone()))
                    .collect();
                Ok(Self::sorted_by_id(items, |e: &$entity| e.id))
            }

            async fn find_followed(&self, user_id: i32) -> Result<Vec<$entity>, RepoError> {
                let ids = self.tracked_ids($kind, user_id, false);
                let items = ids
                    .into_iter()
                    .filter_map(|id| self.$map.get(&id).map(|e| e.value().clone()))
                    .collect();
                Ok(Self::sorted_by_id(items, |e: &$entity| e.id))
            }

            async fn save(&self, mut entity: $entity) -> Result<$entity, RepoError> {
                entity.id = Self::allocate(&self.$counter, entity.id);
                // Child collections are a read-time enrichment, not state.
                entity.activities = Vec::new();
                self.$map.insert(entity.id, entity.clone());
                Ok(entity)
            }

            async fn delete(&self, id: i32) -> Result<bool, RepoError> {
                Ok(self.$map.remove(&id).is_some())
            }
        }
    };
}

impl_trackable_store!(Project, projects, next_project_id, TrackableKind::Project);
impl_trackable_store!(
    Organization,
    organizations,
    next_organization_id,
    TrackableKind::Organization
);

#[async_trait]
impl ActivityStore for InMemoryBackend {
    async fn find_by_id(&self, id: i32) -> Result<Option<Activity>, RepoError> {
        Ok(self.activities.get(&id).map(|e| e.value().clone()))
    }

    async fn find_all(&self) -> Result<Vec<Activity>, RepoError> {
        let items = self.activities.iter().map(|e| e.value().clone()).collect();
        Ok(Self::sorted_by_id(items, |a: &Activity| a.id))
    }

    async fn find_public(&self) -> Result<Vec<Activity>, RepoError> {
        let items = self
            .activities
            .iter()
            .filter(|e| e.value().is_public)
            .map(|e| e.value().clone())
            .collect();
        Ok(Self::sorted_by_id(items, |a: &Activity| a.id))
    }

    async fn find_by_creator(&self, user_id: i32) -> Result<Vec<Activity>, RepoError> {
        let items = self
            .activities
            .iter()
            .filter(|e| e.value().creator_id == user_id)
            .map(|e| e.value().clone())
            .collect();
        Ok(Self::sorted_by_id(items, |a: &Activity| a.id))
    }

    async fn find_for_project(&self, project_id: i32) -> Result<Vec<Activity>, RepoError> {
        let items = self
            .activities
            .iter()
            .filter(|e| e.value().project_id == Some(project_id))
            .map(|e| e.value().clone())
            .collect();
        Ok(Self::sorted_by_id(items, |a: &Activity| a.id))
    }

    async fn find_for_organization(
        &self,
        organization_id: i32,
    ) -> Result<Vec<Activity>, RepoError> {
        let items = self
            .activities
            .iter()
            .filter(|e| e.value().organization_id == Some(organization_id))
            .map(|e| e.value().clone())
            .collect();
        Ok(Self::sorted_by_id(items, |a: &Activity| a.id))
    }

    async fn save(&self, mut activity: Activity) -> Result<Activity, RepoError> {
        activity.id = Self::allocate(&self.next_activity_id, activity.id);
        self.activities.insert(activity.id, activity.clone());
        Ok(activity)
    }

    async fn delete(&self, id: i32) -> Result<bool, RepoError> {
        Ok(self.activities.remove(&id).is_some())
    }
}

#[async_trait]
impl FollowingStore for InMemoryBackend {
    async fn find(&self, key: FollowingKey) -> Result<Option<Following>, RepoError> {
        Ok(self.followings.get(&key).map(|e| e.value().clone()))
    }

    async fn find_for_entity(
        &self,
        kind: TrackableKind,
        entity_id: i32,
    ) -> Result<Vec<Following>, RepoError> {
        let mut items: Vec<Following> = self
            .followings
            .iter()
            .filter(|e| e.value().entity_kind == kind && e.value().entity_id == entity_id)
            .map(|e| e.value().clone())
            .collect();
        items.sort_by_key(|f| f.user_id);
        Ok(items)
    }

    async fn save(&self, mut following: Following) -> Result<Following, RepoError> {
        if following.is_void() {
            return Err(RepoError::InvariantViolation(
                "refusing to persist a following record with both flags false".into(),
            ));
        }

        let key = following.key();
        match self.followings.entry(key) {
            dashmap::Entry::Occupied(mut occupied) => {
                let found = occupied.get().version;
                if found != following.version {
                    return Err(RepoError::VersionConflict {
                        expected: following.version,
                        found,
                    });
                }
                following.version += 1;
                occupied.insert(following.clone());
            }
            dashmap::Entry::Vacant(vacant) => {
                following.version += 1;
                vacant.insert(following.clone());
            }
        }
        Ok(following)
    }

    async fn delete(&self, key: FollowingKey) -> Result<bool, RepoError> {
        Ok(self.followings.remove(&key).is_some())
    }
}

#[async_trait]
impl UserStore for InMemoryBackend {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepoError> {
        Ok(self.users.get(&id).map(|e| e.value().clone()))
    }

    async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        let items = self.users.iter().map(|e| e.value().clone()).collect();
        Ok(Self::sorted_by_id(items, |u: &User| u.id))
    }

    async fn save(&self, mut user: User) -> Result<User, RepoError> {
        user.id = Self::allocate(&self.next_user_id, user.id);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }
}
