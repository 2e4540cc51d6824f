use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::attachments::AttachmentStore;
use crate::entity::{Activity, Organization, Project, User};
use crate::error::AppError;
use crate::following::FollowingEngine;
use crate::models::{ActivityUpdate, NewActivity, Outcome, Upload, validate_title};
use crate::repo::{ActivityStore, TrackableStore};
use crate::visibility::{EntityFilter, VisibilityResolver};

/// Façade over activity listing, mutation and file attachments.
pub struct ActivityService {
    activities: Arc<dyn ActivityStore>,
    projects: Arc<dyn TrackableStore<Project>>,
    organizations: Arc<dyn TrackableStore<Organization>>,
    resolver: Arc<VisibilityResolver>,
    engine: Arc<FollowingEngine>,
    attachments: Arc<AttachmentStore>,
}

impl ActivityService {
    pub fn new(
        activities: Arc<dyn ActivityStore>,
        projects: Arc<dyn TrackableStore<Project>>,
        organizations: Arc<dyn TrackableStore<Organization>>,
        resolver: Arc<VisibilityResolver>,
        engine: Arc<FollowingEngine>,
        attachments: Arc<AttachmentStore>,
    ) -> Self {
        Self {
            activities,
            projects,
            organizations,
            resolver,
            engine,
            attachments,
        }
    }

    async fn enrich(&self, activity: &mut Activity) {
        if let Some(picture) = &activity.picture {
            match self.attachments.load_picture(picture).await {
                Ok(payload) => activity.picture_file = Some(payload),
                Err(e) => tracing::warn!(activity_id = activity.id, "Picture load failed: {e}"),
            }
        }
    }

    async fn find_activity(&self, id: i32) -> Result<Activity, AppError> {
        self.activities
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Activity not found".into()))
    }

    /// Mutation standing: creator, admin, or team member of a linked parent.
    async fn can_mutate(&self, requester: &User, activity: &Activity) -> Result<bool, AppError> {
        if requester.is_admin() || activity.creator_id == requester.id {
            return Ok(true);
        }
        if let Some(project_id) = activity.project_id
            && let Some(project) = self.projects.find_by_id(project_id).await?
            && self.engine.is_assigned(&project, requester.id).await?
        {
            return Ok(true);
        }
        if let Some(organization_id) = activity.organization_id
            && let Some(organization) = self.organizations.find_by_id(organization_id).await?
            && self.engine.is_assigned(&organization, requester.id).await?
        {
            return Ok(true);
        }
        Ok(false)
    }

    #[instrument(skip(self, requester), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn list(
        &self,
        requester: Option<&User>,
        requested_scope: Option<&str>,
        filter: EntityFilter,
    ) -> Result<Vec<Activity>, AppError> {
        let mut items = self
            .resolver
            .resolve_activities(requester, requested_scope, filter, false)
            .await?;
        for activity in &mut items {
            self.enrich(activity).await;
        }
        Ok(items)
    }

    #[instrument(skip(self, requester), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn get(
        &self,
        requester: Option<&User>,
        requested_scope: Option<&str>,
        id: i32,
    ) -> Result<Activity, AppError> {
        let mut items = self
            .resolver
            .resolve_activities(requester, requested_scope, EntityFilter::by_id(id), true)
            .await?;
        let mut activity = items.remove(0);
        self.enrich(&mut activity).await;
        Ok(activity)
    }

    #[instrument(skip_all, fields(requester_id = requester.map(|u| u.id)))]
    pub async fn create(
        &self,
        requester: Option<&User>,
        input: NewActivity,
        picture: Option<Upload>,
        file: Option<Upload>,
    ) -> Result<Outcome<Activity>, AppError> {
        let requester = requester.ok_or(AppError::PermissionDenied)?;
        validate_title("title", &input.title)?;

        if let Some(project_id) = input.project_id
            && self.projects.find_by_id(project_id).await?.is_none()
        {
            return Err(AppError::validation("project_id", "Unknown project"));
        }
        if let Some(organization_id) = input.organization_id
            && self
                .organizations
                .find_by_id(organization_id)
                .await?
                .is_none()
        {
            return Err(AppError::validation("organization_id", "Unknown organization"));
        }

        // The attachment gate runs before anything persists: a rejected file
        // upload fails the whole create and leaves no artifact behind.
        let attachment = match file {
            Some(upload) => Some(
                self.attachments
                    .store(&upload.data, &upload.media_type, &upload.filename)
                    .await?,
            ),
            None => None,
        };

        let activity = Activity {
            id: 0,
            title: input.title.trim().to_string(),
            summary: input.summary,
            post_date: input.post_date.unwrap_or_else(Utc::now),
            is_public: input.is_public,
            creator_id: requester.id,
            project_id: input.project_id,
            organization_id: input.organization_id,
            picture: None,
            picture_file: None,
            attachment,
        };

        let stored = activity.attachment.clone();
        let mut activity = match self.activities.save(activity).await {
            Ok(saved) => saved,
            Err(e) => {
                // Don't orphan the stored artifact when the entity never
                // made it in.
                if let Some(attachment) = &stored {
                    self.attachments.remove(attachment).await;
                }
                return Err(e.into());
            }
        };

        let Some(upload) = picture else {
            return Ok(Outcome::Complete(activity));
        };

        match self
            .attachments
            .store_picture(&upload.data, &upload.media_type, &upload.filename)
            .await
        {
            Ok(name) => {
                activity.picture = Some(name);
                let activity = self.activities.save(activity).await?;
                Ok(Outcome::Complete(activity))
            }
            Err(e) => {
                tracing::warn!(activity_id = activity.id, "Picture upload failed: {e}");
                Ok(Outcome::Partial {
                    entity: activity,
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
        update: ActivityUpdate,
    ) -> Result<Activity, AppError> {
        let requester = requester.ok_or(AppError::PermissionDenied)?;
        let mut activity = self.find_activity(id).await?;

        if !self.can_mutate(requester, &activity).await? {
            return Err(AppError::PermissionDenied);
        }

        if let Some(title) = update.title {
            validate_title("title", &title)?;
            activity.title = title.trim().to_string();
        }
        if let Some(summary) = update.summary {
            activity.summary = summary;
        }
        if let Some(is_public) = update.is_public {
            activity.is_public = is_public;
        }

        Ok(self.activities.save(activity).await?)
    }

    /// Attach a file to an activity, replacing any previous attachment.
    ///
    /// The artifact is stored first and the entity saved second; a failed
    /// save removes the fresh artifact so nothing is orphaned, and the
    /// previous attachment is only dropped once the new record persisted.
    /// Identity and shared fields never change.
    #[instrument(skip(self, requester, file), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn attach_file(
        &self,
        requester: Option<&User>,
        id: i32,
        file: Upload,
    ) -> Result<Activity, AppError> {
        let requester = requester.ok_or(AppError::PermissionDenied)?;
        let mut activity = self.find_activity(id).await?;

        if !self.can_mutate(requester, &activity).await? {
            return Err(AppError::PermissionDenied);
        }

        let fresh = self
            .attachments
            .store(&file.data, &file.media_type, &file.filename)
            .await?;
        let previous = activity.attachment.replace(fresh.clone());

        match self.activities.save(activity).await {
            Ok(saved) => {
                if let Some(previous) = previous {
                    self.attachments.remove(&previous).await;
                }
                Ok(saved)
            }
            Err(e) => {
                self.attachments.remove(&fresh).await;
                Err(e.into())
            }
        }
    }

    /// Remove an activity's attachment, keeping all shared fields intact.
    #[instrument(skip(self, requester), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn detach_file(
        &self,
        requester: Option<&User>,
        id: i32,
    ) -> Result<Activity, AppError> {
        let requester = requester.ok_or(AppError::PermissionDenied)?;
        let mut activity = self.find_activity(id).await?;

        if !self.can_mutate(requester, &activity).await? {
            return Err(AppError::PermissionDenied);
        }

        let Some(attachment) = activity.attachment.take() else {
            return Err(AppError::NotFound("Activity has no attachment".into()));
        };

        let saved = self.activities.save(activity).await?;
        // The record no longer references the artifact; removal is
        // best-effort from here.
        self.attachments.remove(&attachment).await;
        Ok(saved)
    }

    /// Download an activity's attachment after the visibility gate.
    ///
    /// The requester must satisfy the same rule as the owning activity:
    /// public, or creator, or assigned in the linked project, or a member of
    /// the linked organization.
    #[instrument(skip(self, requester), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn fetch_attachment(
        &self,
        requester: Option<&User>,
        id: i32,
    ) -> Result<(Activity, Vec<u8>), AppError> {
        let activity = self.find_activity(id).await?;

        if !self.resolver.can_view_activity(requester, &activity).await? {
            return Err(AppError::PermissionDenied);
        }

        let Some(attachment) = &activity.attachment else {
            return Err(AppError::NotFound("Activity has no attachment".into()));
        };

        let data = self.attachments.retrieve(attachment).await?;
        Ok((activity, data))
    }
}
