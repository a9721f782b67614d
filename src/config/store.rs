use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::AppConfig;
use crate::error::{AppError, Result};

/// Configuration store backed by a TOML file
///
/// Uses `ArcSwap` for lock-free reads, so the block-rate path can consult
/// the configuration without contending with writers.
#[derive(Clone)]
pub struct ConfigStore {
    path: PathBuf,
    /// Lock-free cache using ArcSwap for zero-cost reads
    cache: Arc<ArcSwap<AppConfig>>,
    change_tx: broadcast::Sender<ConfigChange>,
}

/// Configuration change event
#[derive(Debug, Clone)]
pub struct ConfigChange {
    pub path: PathBuf,
}

impl ConfigStore {
    /// Open a configuration file, creating it with defaults when missing
    pub async fn new(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let config = Self::load_config(path).await?;
        let cache = Arc::new(ArcSwap::from_pointee(config));
        let (change_tx, _) = broadcast::channel(16);

        Ok(Self {
            path: path.to_path_buf(),
            cache,
            change_tx,
        })
    }

    /// Load configuration from file
    async fn load_config(path: &Path) -> Result<AppConfig> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                debug!("Loaded configuration from {}", path.display());
                toml::from_str(&text)
                    .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Create default config
                info!("Creating default configuration at {}", path.display());
                let config = AppConfig::default();
                Self::save_config_to_file(path, &config).await?;
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Save configuration to file
    async fn save_config_to_file(path: &Path, config: &AppConfig) -> Result<()> {
        let text = toml::to_string_pretty(config)?;
        tokio::fs::write(path, text).await?;
        Ok(())
    }

    /// Get current configuration (lock-free, zero-copy)
    pub fn get(&self) -> Arc<AppConfig> {
        self.cache.load_full()
    }

    /// Set entire configuration
    pub async fn set(&self, config: AppConfig) -> Result<()> {
        Self::save_config_to_file(&self.path, &config).await?;
        self.cache.store(Arc::new(config));

        // Notify subscribers
        let _ = self.change_tx.send(ConfigChange {
            path: self.path.clone(),
        });

        Ok(())
    }

    /// Update configuration with a closure
    ///
    /// Read-modify-write: with concurrent updates the last write wins.
    pub async fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let current = self.cache.load();
        let mut config = (**current).clone();
        f(&mut config);

        // Persist to file first
        Self::save_config_to_file(&self.path, &config).await?;

        // Then update cache atomically
        self.cache.store(Arc::new(config));

        let _ = self.change_tx.send(ConfigChange {
            path: self.path.clone(),
        });

        Ok(())
    }

    /// Subscribe to configuration changes
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
        self.change_tx.subscribe()
    }

    /// Get the backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::mode::ScanMode;
    use crate::video::format::PixelFormat;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_config_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("pixsig.toml");

        let store = ConfigStore::new(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(*store.get(), AppConfig::default());

        let mut changes = store.subscribe();
        store
            .update(|c| {
                c.video.format = PixelFormat::I420;
                c.scan.mode = ScanMode::Fill;
            })
            .await
            .unwrap();
        assert!(changes.try_recv().is_ok());

        let config = store.get();
        assert_eq!(config.video.format, PixelFormat::I420);

        // Create new store instance and verify persistence
        let store2 = ConfigStore::new(&path).await.unwrap();
        let config = store2.get();
        assert_eq!(config.video.format, PixelFormat::I420);
        assert_eq!(config.scan.mode, ScanMode::Fill);
    }

    #[tokio::test]
    async fn test_invalid_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        tokio::fs::write(&path, "[video]\nformat = \"MJPEG\"\n")
            .await
            .unwrap();

        let err = ConfigStore::new(&path).await.err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }
}
