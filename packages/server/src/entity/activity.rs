use chrono::{DateTime, Utc};
use common::ContentHash;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored binary attachment metadata.
///
/// `unique_id` plus `filename` form the on-disk artifact name; the checksum
/// is recomputed against the stored bytes on every read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub unique_id: Uuid,
    pub checksum: ContentHash,
    pub media_type: String,
    pub size: i64,
    pub filename: String,
}

impl Attachment {
    /// On-disk artifact name.
    pub fn artifact_name(&self) -> String {
        format!("{}-{}", self.unique_id, self.filename)
    }
}

/// Public or private content item, optionally linked to a project or an
/// organization.
///
/// An activity with a file is the same record with `attachment` set; there is
/// no separate file-bearing entity type, so adding or removing a file never
/// rewrites identity or shared fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i32,
    pub title: String,
    pub summary: Option<String>,
    pub post_date: DateTime<Utc>,
    pub is_public: bool,
    pub creator_id: i32,
    pub project_id: Option<i32>,
    pub organization_id: Option<i32>,
    /// Stored picture artifact name, if any.
    pub picture: Option<String>,
    /// Base64 picture payload filled at read time, never persisted.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub picture_file: Option<String>,
    pub attachment: Option<Attachment>,
}
