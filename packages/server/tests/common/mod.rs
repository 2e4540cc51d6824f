// Not every suite uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use common::storage::filesystem::FilesystemBlobStore;
use tempfile::TempDir;

use server::config::{AppConfig, StorageConfig};
use server::entity::{Activity, Organization, Project, Role, User};
use server::repo::memory::InMemoryBackend;
use server::repo::{ActivityStore, TrackableStore, UserStore};
use server::state::AppState;

/// In-process application fixture: in-memory persistence plus a temp-dir
/// artifact store.
pub struct TestApp {
    pub state: AppState,
    pub backend: Arc<InMemoryBackend>,
    artifacts: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let artifacts = tempfile::tempdir().unwrap();
        let root = artifacts.path().join("store");

        let config = AppConfig {
            storage: StorageConfig {
                root: root.display().to_string(),
                max_artifact_size: 4 * 1024 * 1024,
                allowed_media_types: vec![
                    "application/pdf".into(),
                    "image/jpeg".into(),
                    "image/png".into(),
                    "text/plain".into(),
                ],
            },
        };

        let blob = FilesystemBlobStore::new(root, config.storage.max_artifact_size)
            .await
            .unwrap();
        let backend = Arc::new(InMemoryBackend::new());
        let state = AppState::new(config, backend.clone(), Arc::new(blob));

        Self {
            state,
            backend,
            artifacts,
        }
    }

    /// Artifact names currently present on the backing store, `.tmp` aside.
    pub fn stored_artifacts(&self) -> Vec<String> {
        std::fs::read_dir(self.artifacts.path().join("store"))
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name != ".tmp")
            .collect()
    }

    pub async fn seed_user(&self, username: &str, role: Role) -> User {
        UserStore::save(
            &*self.backend,
            User {
                id: 0,
                username: username.into(),
                role,
                disabled: false,
                address: None,
                picture: None,
                picture_file: None,
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap()
    }

    pub async fn seed_project(&self, creator: &User, title: &str, is_public: bool) -> Project {
        TrackableStore::save(
            &*self.backend,
            Project {
                id: 0,
                title: title.into(),
                summary: None,
                is_public,
                creator_id: creator.id,
                address: None,
                picture: None,
                picture_file: None,
                activities: Vec::new(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap()
    }

    pub async fn seed_organization(&self, creator: &User, name: &str) -> Organization {
        TrackableStore::save(
            &*self.backend,
            Organization {
                id: 0,
                name: name.into(),
                summary: None,
                creator_id: creator.id,
                address: None,
                picture: None,
                picture_file: None,
                activities: Vec::new(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap()
    }

    pub async fn seed_activity(
        &self,
        creator: &User,
        title: &str,
        is_public: bool,
        project: Option<&Project>,
        organization: Option<&Organization>,
    ) -> Activity {
        ActivityStore::save(
            &*self.backend,
            Activity {
                id: 0,
                title: title.into(),
                summary: None,
                post_date: Utc::now(),
                is_public,
                creator_id: creator.id,
                project_id: project.map(|p| p.id),
                organization_id: organization.map(|o| o.id),
                picture: None,
                picture_file: None,
                attachment: None,
            },
        )
        .await
        .unwrap()
    }
}
