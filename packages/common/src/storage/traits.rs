use async_trait::async_trait;

use super::error::StorageError;

/// Named binary artifact storage.
///
/// Artifacts are addressed by a flat name chosen by the caller (the attachment
/// layer derives it from a generated unique id plus the upload filename, so
/// concurrent writes never target the same name). The store holds no identity
/// or access-control concept; callers gate access before reading.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write an artifact under the given name, replacing any previous content.
    async fn write(&self, name: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Read all bytes of an artifact.
    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether an artifact exists.
    async fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Delete an artifact.
    ///
    /// Returns `true` if the artifact was deleted, `false` if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;

    /// Mark an artifact read-only for owner and group.
    async fn set_readonly(&self, name: &str) -> Result<(), StorageError>;
}
