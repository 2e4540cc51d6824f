use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::attachments::AttachmentStore;
use crate::entity::{Following, Project, User};
use crate::error::AppError;
use crate::following::FollowingEngine;
use crate::models::{
    MembershipAction, MembershipOutcome, NewProject, Outcome, ProjectUpdate, Upload,
    validate_title,
};
use crate::repo::TrackableStore;
use crate::visibility::{EntityFilter, VisibilityResolver};

/// Façade over project listing, mutation and membership.
pub struct ProjectService {
    projects: Arc<dyn TrackableStore<Project>>,
    resolver: Arc<VisibilityResolver>,
    engine: Arc<FollowingEngine>,
    attachments: Arc<AttachmentStore>,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn TrackableStore<Project>>,
        resolver: Arc<VisibilityResolver>,
        engine: Arc<FollowingEngine>,
        attachments: Arc<AttachmentStore>,
    ) -> Self {
        Self {
            projects,
            resolver,
            engine,
            attachments,
        }
    }

    async fn enrich(&self, project: &mut Project) {
        if let Some(picture) = &project.picture {
            match self.attachments.load_picture(picture).await {
                Ok(payload) => project.picture_file = Some(payload),
                Err(e) => tracing::warn!(project_id = project.id, "Picture load failed: {e}"),
            }
        }
        for activity in &mut project.activities {
            if let Some(picture) = &activity.picture {
                match self.attachments.load_picture(picture).await {
                    Ok(payload) => activity.picture_file = Some(payload),
                    Err(e) => tracing::warn!(activity_id = activity.id, "Picture load failed: {e}"),
                }
            }
        }
    }

    #[instrument(skip(self, requester), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn list(
        &self,
        requester: Option<&User>,
        requested_scope: Option<&str>,
        filter: EntityFilter,
    ) -> Result<Vec<Project>, AppError> {
        let mut items = self
            .resolver
            .resolve_projects(requester, requested_scope, filter, false)
            .await?;
        for project in &mut items {
            self.enrich(project).await;
        }
        Ok(items)
    }

    #[instrument(skip(self, requester), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn get(
        &self,
        requester: Option<&User>,
        requested_scope: Option<&str>,
        id: i32,
    ) -> Result<Project, AppError> {
        let mut items = self
            .resolver
            .resolve_projects(requester, requested_scope, EntityFilter::by_id(id), true)
            .await?;
        let mut project = items.remove(0);
        self.enrich(&mut project).await;
        Ok(project)
    }

    #[instrument(skip_all, fields(requester_id = requester.map(|u| u.id)))]
    pub async fn create(
        &self,
        requester: Option<&User>,
        input: NewProject,
        picture: Option<Upload>,
    ) -> Result<Outcome<Project>, AppError> {
        let requester = requester.ok_or(AppError::PermissionDenied)?;
        validate_title("title", &input.title)?;

        let mut project = self
            .projects
            .save(Project {
                id: 0,
                title: input.title.trim().to_string(),
                summary: input.summary,
                is_public: input.is_public,
                creator_id: requester.id,
                address: None,
                picture: None,
                picture_file: None,
                activities: Vec::new(),
                created_at: Utc::now(),
            })
            .await?;

        let Some(upload) = picture else {
            return Ok(Outcome::Complete(project));
        };

        // The project persisted; a failing picture upload downgrades the
        // outcome instead of discarding it.
        match self
            .attachments
            .store_picture(&upload.data, &upload.media_type, &upload.filename)
            .await
        {
            Ok(name) => {
                project.picture = Some(name);
                let project = self.projects.save(project).await?;
                Ok(Outcome::Complete(project))
            }
            Err(e) => {
                tracing::warn!(project_id = project.id, "Picture upload failed: {e}");
                Ok(Outcome::Partial {
                    entity: project,
                    failure: e.to_string(),
                })
            }
        }
    }

    #[instrument(skip(self, requester, update), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn update(
        &self,
        requester: Option<&User>,
        id: i32,
        update: ProjectUpdate,
    ) -> Result<Project, AppError> {
        let requester = requester.ok_or(AppError::PermissionDenied)?;
        let mut project = self
            .projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

        // Mutation requires team standing (creator or assignee) or admin.
        if !requester.is_admin() && !self.engine.is_assigned(&project, requester.id).await? {
            return Err(AppError::PermissionDenied);
        }

        if let Some(title) = update.title {
            validate_title("title", &title)?;
            project.title = title.trim().to_string();
        }
        if let Some(summary) = update.summary {
            project.summary = summary;
        }
        if let Some(is_public) = update.is_public {
            project.is_public = is_public;
        }

        Ok(self.projects.save(project).await?)
    }

    #[instrument(skip(self, requester), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn mutate_membership(
        &self,
        requester: Option<&User>,
        id: i32,
        action: MembershipAction,
        target: Option<i32>,
    ) -> Result<MembershipOutcome<Project>, AppError> {
        let project = self
            .projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

        let state =
            super::membership::mutate(&self.engine, &project, requester, action, target).await?;

        Ok(MembershipOutcome {
            entity: project,
            state,
        })
    }

    /// The project's team: creator first, then explicit assignees.
    pub async fn team(&self, id: i32) -> Result<Vec<User>, AppError> {
        let project = self
            .projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".into()))?;
        self.engine.team(&project).await
    }

    pub async fn followers(&self, id: i32) -> Result<Vec<Following>, AppError> {
        let project = self
            .projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".into()))?;
        self.engine.followers(&project).await
    }

    /// Convenience passthrough for callers that already hold the entity.
    pub async fn is_assigned(&self, project: &Project, user_id: i32) -> Result<bool, AppError> {
        self.engine.is_assigned(project, user_id).await
    }
}
