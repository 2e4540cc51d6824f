use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::following::FollowingState;

/// Raw upload passed in by the (out-of-scope) controller layer after field
/// extraction.
#[derive(Clone, Debug)]
pub struct Upload {
    pub data: Vec<u8>,
    pub media_type: String,
    pub filename: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub summary: Option<String>,
    pub is_public: bool,
}

/// Patch semantics: `None` leaves a field untouched; `Some(None)` on a
/// nullable field clears it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub summary: Option<Option<String>>,
    pub is_public: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub summary: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub summary: Option<Option<String>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewActivity {
    pub title: String,
    pub summary: Option<String>,
    pub post_date: Option<DateTime<Utc>>,
    pub is_public: bool,
    pub project_id: Option<i32>,
    pub organization_id: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ActivityUpdate {
    pub title: Option<String>,
    pub summary: Option<Option<String>>,
    pub is_public: Option<bool>,
}

/// Outcome of a create/update that may partially succeed.
///
/// A failed optional side effect (a picture upload, say) is reported next to
/// the persisted entity: never silently dropped, never escalated to a full
/// failure once the primary entity persisted.
#[derive(Clone, Debug, Serialize)]
pub enum Outcome<T> {
    Complete(T),
    Partial { entity: T, failure: String },
}

impl<T> Outcome<T> {
    pub fn entity(&self) -> &T {
        match self {
            Outcome::Complete(entity) => entity,
            Outcome::Partial { entity, .. } => entity,
        }
    }

    pub fn into_entity(self) -> T {
        match self {
            Outcome::Complete(entity) => entity,
            Outcome::Partial { entity, .. } => entity,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Outcome::Partial { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipAction {
    Follow,
    Unfollow,
    Assign,
    Unassign,
}

/// Result of a membership mutation: the refreshed entity plus the
/// relationship state that now governs it.
#[derive(Clone, Debug, Serialize)]
pub struct MembershipOutcome<T> {
    pub entity: T,
    pub state: FollowingState,
}

/// Validate a trimmed title (1-256 Unicode characters).
pub fn validate_title(field: &str, title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::validation(
            field,
            "Must be 1-256 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_bounds() {
        assert!(validate_title("title", "ok").is_ok());
        assert!(validate_title("title", "   ").is_err());
        assert!(validate_title("title", &"x".repeat(257)).is_err());
        assert!(validate_title("title", &"x".repeat(256)).is_ok());
    }
}
