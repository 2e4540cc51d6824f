use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::attachments::AttachmentStore;
use crate::entity::{Following, Organization, User};
use crate::error::AppError;
use crate::following::FollowingEngine;
use crate::models::{
    MembershipAction, MembershipOutcome, NewOrganization, OrganizationUpdate, Outcome, Upload,
    validate_title,
};
use crate::repo::TrackableStore;
use crate::visibility::{EntityFilter, VisibilityResolver};

/// Façade over organization listing, mutation and membership.
///
/// An organization's membership set is its team: the creator plus explicit
/// assignees, managed through the same following lifecycle as projects.
pub struct OrganizationService {
    organizations: Arc<dyn TrackableStore<Organization>>,
    resolver: Arc<VisibilityResolver>,
    engine: Arc<FollowingEngine>,
    attachments: Arc<AttachmentStore>,
}

impl OrganizationService {
    pub fn new(
        organizations: Arc<dyn TrackableStore<Organization>>,
        resolver: Arc<VisibilityResolver>,
        engine: Arc<FollowingEngine>,
        attachments: Arc<AttachmentStore>,
    ) -> Self {
        Self {
            organizations,
            resolver,
            engine,
            attachments,
        }
    }

    async fn enrich(&self, organization: &mut Organization) {
        if let Some(picture) = &organization.picture {
            match self.attachments.load_picture(picture).await {
                Ok(payload) => organization.picture_file = Some(payload),
                Err(e) => {
                    tracing::warn!(organization_id = organization.id, "Picture load failed: {e}")
                }
            }
        }
        for activity in &mut organization.activities {
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
    ) -> Result<Vec<Organization>, AppError> {
        let mut items = self
            .resolver
            .resolve_organizations(requester, requested_scope, filter, false)
            .await?;
        for organization in &mut items {
            self.enrich(organization).await;
        }
        Ok(items)
    }

    #[instrument(skip(self, requester), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn get(
        &self,
        requester: Option<&User>,
        requested_scope: Option<&str>,
        id: i32,
    ) -> Result<Organization, AppError> {
        let mut items = self
            .resolver
            .resolve_organizations(requester, requested_scope, EntityFilter::by_id(id), true)
            .await?;
        let mut organization = items.remove(0);
        self.enrich(&mut organization).await;
        Ok(organization)
    }

    #[instrument(skip_all, fields(requester_id = requester.map(|u| u.id)))]
    pub async fn create(
        &self,
        requester: Option<&User>,
        input: NewOrganization,
        picture: Option<Upload>,
    ) -> Result<Outcome<Organization>, AppError> {
        let requester = requester.ok_or(AppError::PermissionDenied)?;
        validate_title("name", &input.name)?;

        let mut organization = self
            .organizations
            .save(Organization {
                id: 0,
                name: input.name.trim().to_string(),
                summary: input.summary,
                creator_id: requester.id,
                address: None,
                picture: None,
                picture_file: None,
                activities: Vec::new(),
                created_at: Utc::now(),
            })
            .await?;

        let Some(upload) = picture else {
            return Ok(Outcome::Complete(organization));
        };

        match self
            .attachments
            .store_picture(&upload.data, &upload.media_type, &upload.filename)
            .await
        {
            Ok(name) => {
                organization.picture = Some(name);
                let organization = self.organizations.save(organization).await?;
                Ok(Outcome::Complete(organization))
            }
            Err(e) => {
                tracing::warn!(
                    organization_id = organization.id,
                    "Picture upload failed: {e}"
                );
                Ok(Outcome::Partial {
                    entity: organization,
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
        update: OrganizationUpdate,
    ) -> Result<Organization, AppError> {
        let requester = requester.ok_or(AppError::PermissionDenied)?;
        let mut organization = self
            .organizations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;

        if !requester.is_admin() && !self.engine.is_assigned(&organization, requester.id).await? {
            return Err(AppError::PermissionDenied);
        }

        if let Some(name) = update.name {
            validate_title("name", &name)?;
            organization.name = name.trim().to_string();
        }
        if let Some(summary) = update.summary {
            organization.summary = summary;
        }

        Ok(self.organizations.save(organization).await?)
    }

    #[instrument(skip(self, requester), fields(requester_id = requester.map(|u| u.id)))]
    pub async fn mutate_membership(
        &self,
        requester: Option<&User>,
        id: i32,
        action: MembershipAction,
        target: Option<i32>,
    ) -> Result<MembershipOutcome<Organization>, AppError> {
        let organization = self
            .organizations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;

        let state =
            super::membership::mutate(&self.engine, &organization, requester, action, target)
                .await?;

        Ok(MembershipOutcome {
            entity: organization,
            state,
        })
    }

    /// The organization's membership set: creator first, then explicit
    /// assignees.
    pub async fn members(&self, id: i32) -> Result<Vec<User>, AppError> {
        let organization = self
            .organizations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
        self.engine.team(&organization).await
    }

    pub async fn followers(&self, id: i32) -> Result<Vec<Following>, AppError> {
        let organization = self
            .organizations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
        self.engine.followers(&organization).await
    }
}
