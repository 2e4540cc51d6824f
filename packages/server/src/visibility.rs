use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::entity::{Activity, Organization, Project, Trackable, User};
use crate::error::AppError;
use crate::following::FollowingEngine;
use crate::repo::{ActivityStore, TrackableStore};

/// Access lens a list query is resolved under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Public,
    Owned,
    Followed,
    Assigned,
    Admin,
}

impl Scope {
    fn parse(raw: &str) -> Option<Scope> {
        match raw {
            "public" => Some(Scope::Public),
            "owned" => Some(Scope::Owned),
            "followed" => Some(Scope::Followed),
            "assigned" => Some(Scope::Assigned),
            "admin" => Some(Scope::Admin),
            _ => None,
        }
    }

    /// Normalize a requested scope against the requester.
    ///
    /// This is the single place that interprets requester absence:
    /// 1. no requester forces `public`, whatever was asked;
    /// 2. `admin` without the ADMIN role silently downgrades to `public`;
    /// 3. anything outside the recognized enumeration falls back to `public`.
    pub fn normalize(requester: Option<&User>, requested: Option<&str>) -> Scope {
        let Some(user) = requester else {
            return Scope::Public;
        };
        let scope = requested.and_then(Scope::parse).unwrap_or(Scope::Public);
        if scope == Scope::Admin && !user.is_admin() {
            return Scope::Public;
        }
        scope
    }
}

/// Optional narrowing of the candidate set.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityFilter {
    pub id: Option<i32>,
}

impl EntityFilter {
    pub fn by_id(id: i32) -> Self {
        Self { id: Some(id) }
    }
}

/// Selects candidate entities per scope and filters nested activity
/// collections by membership.
pub struct VisibilityResolver {
    projects: Arc<dyn TrackableStore<Project>>,
    organizations: Arc<dyn TrackableStore<Organization>>,
    activities: Arc<dyn ActivityStore>,
    engine: Arc<FollowingEngine>,
}

impl VisibilityResolver {
    pub fn new(
        projects: Arc<dyn TrackableStore<Project>>,
        organizations: Arc<dyn TrackableStore<Organization>>,
        activities: Arc<dyn ActivityStore>,
        engine: Arc<FollowingEngine>,
    ) -> Self {
        Self {
            projects,
            organizations,
            activities,
            engine,
        }
    }

    /// Scope-specific selection. `assigned` unions creator-owned entities
    /// with the explicit assigner join, deduplicated so nothing is counted
    /// twice.
    async fn select<T: Trackable + Clone>(
        store: &dyn TrackableStore<T>,
        scope: Scope,
        requester_id: Option<i32>,
        filter: EntityFilter,
    ) -> Result<Vec<T>, AppError> {
        let mut items = match (scope, requester_id) {
            (Scope::Public | Scope::Admin, _) | (_, None) => store.find_all().await?,
            (Scope::Owned, Some(uid)) => store.find_by_creator(uid).await?,
            (Scope::Followed, Some(uid)) => store.find_followed(uid).await?,
            (Scope::Assigned, Some(uid)) => {
                let mut owned = store.find_by_creator(uid).await?;
                let mut seen: HashSet<i32> = owned.iter().map(|e| e.id()).collect();
                for entity in store.find_assigned(uid).await? {
                    if seen.insert(entity.id()) {
                        owned.push(entity);
                    }
                }
                owned.sort_by_key(|e| e.id());
                owned
            }
        };

        if let Some(id) = filter.id {
            items.retain(|e| e.id() == id);
        }
        Ok(items)
    }

    /// Filter an entity's child activities per the resolved scope.
    ///
    /// Public (and followed-but-not-assigned) requesters only see public
    /// activities; owners, assignees and admins see everything.
    async fn visible_children<T: Trackable>(
        &self,
        scope: Scope,
        requester: Option<&User>,
        entity: &T,
        activities: Vec<Activity>,
    ) -> Result<Vec<Activity>, AppError> {
        let unfiltered = match (scope, requester) {
            (Scope::Public, _) => false,
            (Scope::Owned | Scope::Assigned | Scope::Admin, _) => true,
            (Scope::Followed, Some(user)) => self.engine.is_assigned(entity, user.id).await?,
            (Scope::Followed, None) => false,
        };
        if unfiltered {
            return Ok(activities);
        }
        Ok(activities.into_iter().filter(|a| a.is_public).collect())
    }

    fn check_found<T>(items: Vec<T>, require_found: bool) -> Result<Vec<T>, AppError> {
        if items.is_empty() && require_found {
            return Err(AppError::NotFound("Entity not found".into()));
        }
        Ok(items)
    }

    #[instrument(skip(self, requester), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn resolve_projects(
        &self,
        requester: Option<&User>,
        requested_scope: Option<&str>,
        filter: EntityFilter,
        require_found: bool,
    ) -> Result<Vec<Project>, AppError> {
        let scope = Scope::normalize(requester, requested_scope);
        let mut items =
            Self::select(&*self.projects, scope, requester.map(|u| u.id), filter).await?;

        for project in &mut items {
            let children = self.activities.find_for_project(project.id).await?;
            project.activities = self
                .visible_children(scope, requester, project, children)
                .await?;
        }

        Self::check_found(items, require_found)
    }

    #[instrument(skip(self, requester), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn resolve_organizations(
        &self,
        requester: Option<&User>,
        requested_scope: Option<&str>,
        filter: EntityFilter,
        require_found: bool,
    ) -> Result<Vec<Organization>, AppError> {
        let scope = Scope::normalize(requester, requested_scope);
        let mut items =
            Self::select(&*self.organizations, scope, requester.map(|u| u.id), filter).await?;

        for organization in &mut items {
            let children = self
                .activities
                .find_for_organization(organization.id)
                .await?;
            organization.activities = self
                .visible_children(scope, requester, organization, children)
                .await?;
        }

        Self::check_found(items, require_found)
    }

    /// Resolve standalone activities. `followed`/`assigned` select the
    /// activities of trackable entities the requester follows or is assigned
    /// to; a follower who is not a team member still only sees public
    /// activity of the followed entity.
    #[instrument(skip(self, requester), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn resolve_activities(
        &self,
        requester: Option<&User>,
        requested_scope: Option<&str>,
        filter: EntityFilter,
        require_found: bool,
    ) -> Result<Vec<Activity>, AppError> {
        let scope = Scope::normalize(requester, requested_scope);
        let requester_id = requester.map(|u| u.id);

        let mut items = match (scope, requester_id) {
            (Scope::Public, _) | (_, None) => self.activities.find_public().await?,
            (Scope::Admin, _) => self.activities.find_all().await?,
            (Scope::Owned, Some(uid)) => self.activities.find_by_creator(uid).await?,
            (Scope::Assigned, Some(uid)) => self.tracked_activities(uid, true).await?,
            (Scope::Followed, Some(uid)) => self.tracked_activities(uid, false).await?,
        };

        if let Some(id) = filter.id {
            items.retain(|a| a.id == id);
        }
        Self::check_found(items, require_found)
    }

    /// Activities belonging to projects/organizations the user is assigned
    /// to (`assigned = true`) or follows (`assigned = false`). The followed
    /// variant applies the public-only filter per parent unless the user is
    /// also on that parent's team.
    async fn tracked_activities(
        &self,
        user_id: i32,
        assigned: bool,
    ) -> Result<Vec<Activity>, AppError> {
        let scope = if assigned {
            Scope::Assigned
        } else {
            Scope::Followed
        };
        let mut collected = Vec::new();
        let mut seen = HashSet::new();

        let projects =
            Self::select(&*self.projects, scope, Some(user_id), EntityFilter::default()).await?;
        for project in projects {
            let children = self.activities.find_for_project(project.id).await?;
            let visible = if assigned || self.engine.is_assigned(&project, user_id).await? {
                children
            } else {
                children.into_iter().filter(|a| a.is_public).collect()
            };
            for activity in visible {
                if seen.insert(activity.id) {
                    collected.push(activity);
                }
            }
        }

        let organizations = Self::select(
            &*self.organizations,
            scope,
            Some(user_id),
            EntityFilter::default(),
        )
        .await?;
        for organization in organizations {
            let children = self
                .activities
                .find_for_organization(organization.id)
                .await?;
            let visible = if assigned || self.engine.is_assigned(&organization, user_id).await? {
                children
            } else {
                children.into_iter().filter(|a| a.is_public).collect()
            };
            for activity in visible {
                if seen.insert(activity.id) {
                    collected.push(activity);
                }
            }
        }

        collected.sort_by_key(|a| a.id);
        Ok(collected)
    }

    /// Whether the requester may see this specific activity: it is public,
    /// or they created it, or they are on the linked project's team or a
    /// member of the linked organization, or they are an admin.
    pub async fn can_view_activity(
        &self,
        requester: Option<&User>,
        activity: &Activity,
    ) -> Result<bool, AppError> {
        if activity.is_public {
            return Ok(true);
        }
        let Some(user) = requester else {
            return Ok(false);
        };
        if user.is_admin() || activity.creator_id == user.id {
            return Ok(true);
        }

        if let Some(project_id) = activity.project_id
            && let Some(project) = self.projects.find_by_id(project_id).await?
            && self.engine.is_assigned(&project, user.id).await?
        {
            return Ok(true);
        }

        if let Some(organization_id) = activity.organization_id
            && let Some(organization) = self.organizations.find_by_id(organization_id).await?
            && self.engine.is_assigned(&organization, user.id).await?
        {
            return Ok(true);
        }

        Ok(false)
    }
}
