use std::sync::Arc;

use common::BlobStore;

use crate::attachments::AttachmentStore;
use crate::config::AppConfig;
use crate::entity::{Organization, Project};
use crate::following::FollowingEngine;
use crate::repo::{ActivityStore, FollowingStore, TrackableStore, UserStore};
use crate::services::{ActivityService, OrganizationService, ProjectService};
use crate::visibility::VisibilityResolver;

/// Shared application state: the three façade services plus the pieces they
/// are built from, for callers that need direct access.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<FollowingEngine>,
    pub resolver: Arc<VisibilityResolver>,
    pub attachments: Arc<AttachmentStore>,
    pub projects: Arc<ProjectService>,
    pub organizations: Arc<OrganizationService>,
    pub activities: Arc<ActivityService>,
}

impl AppState {
    /// Wire the services over one persistence backend and one blob store.
    pub fn new<B>(config: AppConfig, backend: Arc<B>, blob: Arc<dyn BlobStore>) -> Self
    where
        B: TrackableStore<Project>
            + TrackableStore<Organization>
            + ActivityStore
            + FollowingStore
            + UserStore
            + 'static,
    {
        let projects: Arc<dyn TrackableStore<Project>> = backend.clone();
        let organizations: Arc<dyn TrackableStore<Organization>> = backend.clone();
        let activities: Arc<dyn ActivityStore> = backend.clone();
        let followings: Arc<dyn FollowingStore> = backend.clone();
        let users: Arc<dyn UserStore> = backend;

        let engine = Arc::new(FollowingEngine::new(followings, users));
        let resolver = Arc::new(VisibilityResolver::new(
            projects.clone(),
            organizations.clone(),
            activities.clone(),
            engine.clone(),
        ));
        let attachments = Arc::new(AttachmentStore::new(blob, &config.storage));

        let project_service = Arc::new(ProjectService::new(
            projects.clone(),
            resolver.clone(),
            engine.clone(),
            attachments.clone(),
        ));
        let organization_service = Arc::new(OrganizationService::new(
            organizations.clone(),
            resolver.clone(),
            engine.clone(),
            attachments.clone(),
        ));
        let activity_service = Arc::new(ActivityService::new(
            activities,
            projects,
            organizations,
            resolver.clone(),
            engine.clone(),
            attachments.clone(),
        ));

        Self {
            config: Arc::new(config),
            engine,
            resolver,
            attachments,
            projects: project_service,
            organizations: organization_service,
            activities: activity_service,
        }
    }
}
