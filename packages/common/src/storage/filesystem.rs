use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::name::validate_flat_name;
use super::traits::BlobStore;

/// Filesystem-backed artifact store.
///
/// Artifacts live flat under `base_path`; writes go through a temp file in
/// `{base_path}/.tmp` and are moved into place with a rename, so readers never
/// observe a half-written artifact.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem artifact store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn artifact_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        let name = validate_flat_name(name)
            .map_err(|e| StorageError::InvalidName(e.message().into()))?;
        Ok(self.base_path.join(name))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn write(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let artifact_path = self.artifact_path(name)?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        // A previous read-only artifact under the same name would make the
        // rename fail on some platforms; drop it first.
        if fs::try_exists(&artifact_path).await? {
            let _ = fs::remove_file(&artifact_path).await;
        }

        if let Err(e) = fs::rename(&temp_path, &artifact_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(name, size = data.len(), "Stored artifact");
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let artifact_path = self.artifact_path(name)?;
        match fs::read(&artifact_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let artifact_path = self.artifact_path(name)?;
        Ok(fs::try_exists(&artifact_path).await?)
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let artifact_path = self.artifact_path(name)?;
        match fs::remove_file(&artifact_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_readonly(&self, name: &str) -> Result<(), StorageError> {
        let artifact_path = self.artifact_path(name)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o440);
            match fs::set_permissions(&artifact_path, perms).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(StorageError::NotFound(name.to_string()))
                }
                Err(e) => Err(e.into()),
            }
        }

        #[cfg(not(unix))]
        {
            let meta = fs::metadata(&artifact_path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StorageError::NotFound(name.to_string())
                } else {
                    StorageError::from(e)
                }
            })?;
            let mut perms = meta.permissions();
            perms.set_readonly(true);
            fs::set_permissions(&artifact_path, perms).await?;
            Ok(())
        }
    }
}
