use anyhow::Result;
use std::path::PathBuf;

/// `$CATALOGSYNC_BASE_PATH`, defaulting to "/app".
fn container_base_path() -> PathBuf {
    std::env::var("CATALOGSYNC_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("catalogsync");

        Ok(Self::with_base(base_dir))
    }

    /// Config files at `base`, data and logs in subdirectories.
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }

    /// Compressed snapshot of the catalog store.
    pub fn store_snapshot_file(&self) -> PathBuf {
        self.data_dir.join("catalog.bin")
    }

    pub fn daemon_log_file(&self) -> PathBuf {
        self.log_dir.join("catalogsync.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // The container image creates the base directory, so its presence means we run in Docker
        let base = container_base_path();
        if base.exists() {
            return Self::with_base(base);
        }

        Self::new().unwrap_or_else(|_| Self::with_base(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_base() {
        let paths = PathManager::with_base(PathBuf::from("/srv/catalogsync"));
        assert_eq!(paths.config_file(), PathBuf::from("/srv/catalogsync/config.toml"));
        assert_eq!(
            paths.store_snapshot_file(),
            PathBuf::from("/srv/catalogsync/data/catalog.bin")
        );
        assert_eq!(
            paths.daemon_log_file(),
            PathBuf::from("/srv/catalogsync/logs/catalogsync.log")
        );
    }
}
