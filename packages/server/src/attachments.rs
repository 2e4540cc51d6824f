use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use common::storage::name::validate_flat_name;
use common::{BlobStore, ContentHash, StorageError};
use tracing::instrument;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::entity::Attachment;
use crate::error::AppError;

/// Uploads, content-addresses and gates retrieval of binary artifacts.
///
/// The store holds no identity concept: the façade establishes visibility
/// before calling [`AttachmentStore::retrieve`]. The recorded checksum is the
/// source of truth for integrity, not the filesystem.
pub struct AttachmentStore {
    blob: Arc<dyn BlobStore>,
    allowed_media_types: Vec<String>,
    max_artifact_size: u64,
}

impl AttachmentStore {
    pub fn new(blob: Arc<dyn BlobStore>, config: &StorageConfig) -> Self {
        Self {
            blob,
            allowed_media_types: config.allowed_media_types.clone(),
            max_artifact_size: config.max_artifact_size,
        }
    }

    fn check_media_type(&self, declared: &str) -> Result<(), AppError> {
        let declared = declared.trim();
        if self
            .allowed_media_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(declared))
        {
            return Ok(());
        }
        Err(AppError::UnsupportedMediaType(declared.to_string()))
    }

    /// Store an upload and return its artifact metadata.
    ///
    /// The media-type gate and filename validation run before anything
    /// touches the backing store, so a rejected upload leaves no artifact
    /// behind. The artifact is made read-only once written.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn store(
        &self,
        data: &[u8],
        declared_media_type: &str,
        filename: &str,
    ) -> Result<Attachment, AppError> {
        self.check_media_type(declared_media_type)?;

        let filename = validate_flat_name(filename)
            .map_err(|e| AppError::validation("filename", e.message()))?
            .to_string();

        if data.len() as u64 > self.max_artifact_size {
            return Err(AppError::validation(
                "file",
                format!(
                    "File exceeds maximum size of {} bytes",
                    self.max_artifact_size
                ),
            ));
        }

        let attachment = Attachment {
            unique_id: Uuid::new_v4(),
            checksum: ContentHash::compute(data),
            media_type: declared_media_type.trim().to_string(),
            size: data.len() as i64,
            filename,
        };

        let name = attachment.artifact_name();
        self.blob.write(&name, data).await?;

        if let Err(e) = self.blob.set_readonly(&name).await {
            // The artifact is intact; losing the permission tightening is
            // not worth failing the upload.
            tracing::warn!(artifact = %name, "Failed to mark artifact read-only: {e}");
        }

        Ok(attachment)
    }

    /// Read an artifact back, verifying its checksum.
    ///
    /// The comparison runs on every retrieval: a mismatch means the backing
    /// bytes were corrupted or tampered with out-of-band and surfaces as
    /// [`AppError::Corrupted`], never as stale data.
    #[instrument(skip(self), fields(artifact = %attachment.artifact_name()))]
    pub async fn retrieve(&self, attachment: &Attachment) -> Result<Vec<u8>, AppError> {
        let name = attachment.artifact_name();
        let data = match self.blob.read(&name).await {
            Ok(data) => data,
            Err(StorageError::NotFound(_)) => {
                return Err(AppError::NotFound(format!("Artifact '{name}' not found")));
            }
            Err(e) => return Err(e.into()),
        };

        if !attachment.checksum.matches(&data) {
            tracing::error!(artifact = %name, "Artifact checksum mismatch");
            return Err(AppError::Corrupted(name));
        }

        Ok(data)
    }

    /// Best-effort removal; a missing artifact is not an error.
    #[instrument(skip(self), fields(artifact = %attachment.artifact_name()))]
    pub async fn remove(&self, attachment: &Attachment) {
        let name = attachment.artifact_name();
        match self.blob.delete(&name).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(artifact = %name, "Artifact already absent"),
            Err(e) => tracing::warn!(artifact = %name, "Failed to remove artifact: {e}"),
        }
    }

    /// Read a stored picture and return it as an embedded base64 payload.
    ///
    /// Read-time enrichment for the transient `picture_file` fields; nothing
    /// here is persisted.
    pub async fn load_picture(&self, picture: &str) -> Result<String, AppError> {
        let data = self.blob.read(picture).await?;
        let media_type = mime_guess::from_path(picture)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        Ok(format!(
            "data:{media_type};base64,{}",
            BASE64.encode(&data)
        ))
    }

    /// Store an optional picture upload, returning the artifact name.
    pub async fn store_picture(
        &self,
        data: &[u8],
        declared_media_type: &str,
        filename: &str,
    ) -> Result<String, AppError> {
        let attachment = self.store(data, declared_media_type, filename).await?;
        Ok(attachment.artifact_name())
    }
}

#[cfg(test)]
mod tests {
    use common::storage::filesystem::FilesystemBlobStore;

    use super::*;

    async fn store_with_allowlist(allowed: &[&str]) -> (AttachmentStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let blob = FilesystemBlobStore::new(dir.path().join("artifacts"), 1024 * 1024)
            .await
            .unwrap();
        let config = StorageConfig {
            root: dir.path().display().to_string(),
            max_artifact_size: 1024 * 1024,
            allowed_media_types: allowed.iter().map(|s| s.to_string()).collect(),
        };
        (AttachmentStore::new(Arc::new(blob), &config), dir)
    }

    #[tokio::test]
    async fn store_then_retrieve_round_trips() {
        let (store, _dir) = store_with_allowlist(&["text/plain"]).await;
        let attachment = store.store(b"hello", "text/plain", "a.txt").await.unwrap();

        assert_eq!(attachment.size, 5);
        assert_eq!(attachment.filename, "a.txt");
        assert!(attachment.checksum.matches(b"hello"));

        let data = store.retrieve(&attachment).await.unwrap();
        assert_eq!(data, b"hello");
    }

    #[tokio::test]
    async fn mime_gate_leaves_nothing_behind() {
        let (store, dir) = store_with_allowlist(&["application/pdf", "image/jpeg"]).await;

        let result = store
            .store(b"MZ", "application/x-executable", "x.bin")
            .await;
        assert!(matches!(result, Err(AppError::UnsupportedMediaType(_))));

        // No artifact was written.
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("artifacts"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name() != ".tmp")
            .collect();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn media_type_comparison_is_case_insensitive() {
        let (store, _dir) = store_with_allowlist(&["image/jpeg"]).await;
        assert!(store.store(b"JPEG", "Image/JPEG", "p.jpg").await.is_ok());
    }

    #[tokio::test]
    async fn retrieve_detects_out_of_band_mutation() {
        let (store, dir) = store_with_allowlist(&["text/plain"]).await;
        let attachment = store
            .store(b"original", "text/plain", "a.txt")
            .await
            .unwrap();

        // Mutate the backing bytes behind the store's back.
        let path = dir.path().join("artifacts").join(attachment.artifact_name());
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            perms.set_mode(0o644);
        }
        std::fs::set_permissions(&path, perms).unwrap();
        std::fs::write(&path, b"tampered").unwrap();

        let result = store.retrieve(&attachment).await;
        assert!(matches!(result, Err(AppError::Corrupted(_))));
    }

    #[tokio::test]
    async fn retrieve_missing_artifact_is_not_found() {
        let (store, dir) = store_with_allowlist(&["text/plain"]).await;
        let attachment = store.store(b"data", "text/plain", "a.txt").await.unwrap();

        let path = dir.path().join("artifacts").join(attachment.artifact_name());
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            perms.set_mode(0o644);
        }
        std::fs::set_permissions(&path, perms).unwrap();
        std::fs::remove_file(&path).unwrap();

        let result = store.retrieve(&attachment).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn remove_is_best_effort() {
        let (store, _dir) = store_with_allowlist(&["text/plain"]).await;
        let attachment = store.store(b"bye", "text/plain", "a.txt").await.unwrap();

        store.remove(&attachment).await;
        // Removing again is quietly accepted.
        store.remove(&attachment).await;

        assert!(matches!(
            store.retrieve(&attachment).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rejects_path_escaping_filenames() {
        let (store, _dir) = store_with_allowlist(&["text/plain"]).await;
        let result = store.store(b"x", "text/plain", "../escape.txt").await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn load_picture_embeds_base64() {
        let (store, _dir) = store_with_allowlist(&["image/png"]).await;
        let name = store.store_picture(b"PNG", "image/png", "p.png").await.unwrap();

        let payload = store.load_picture(&name).await.unwrap();
        assert!(payload.starts_with("data:image/png;base64,"));
        assert!(payload.ends_with(&BASE64.encode(b"PNG")));
    }
}
