use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Attachment and picture storage settings.
///
/// `allowed_media_types` is loaded once at process start and injected by
/// value; nothing in the core reads configuration globally.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Base directory for stored artifacts.
    pub root: String,
    /// Maximum artifact size in bytes.
    pub max_artifact_size: u64,
    /// Declared media types accepted for uploads.
    pub allowed_media_types: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("storage.root", "./artifacts")?
            .set_default("storage.max_artifact_size", 128 * 1024 * 1024i64)?
            .set_default(
                "storage.allowed_media_types",
                vec![
                    "application/pdf",
                    "image/jpeg",
                    "image/png",
                    "text/plain",
                ],
            )?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., AGORA__STORAGE__ROOT)
            .add_source(Environment::with_prefix("AGORA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load() {
        let config = AppConfig::load().unwrap();
        assert!(!config.storage.allowed_media_types.is_empty());
        assert!(config.storage.max_artifact_size > 0);
    }
}
