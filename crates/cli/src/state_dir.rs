//! Platform-specific state directory management

use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::warn;

/// Manages platform-specific application directories
pub struct StateDir {
    /// Project directories from the directories crate
    project_dirs: Option<ProjectDirs>,
    /// Override directory for testing or custom installations
    override_dir: Option<PathBuf>,
}

impl StateDir {
    /// Create a new StateDir instance
    pub fn new() -> Self {
        let project_dirs = ProjectDirs::from("dev", "SessionGuard", "sessionguard");
        if project_dirs.is_none() {
            warn!("Failed to determine platform-specific directories, will use fallback");
        }
        Self {
            project_dirs,
            override_dir: None,
        }
    }

    /// Create a new StateDir with an override directory
    pub fn with_override(path: impl Into<PathBuf>) -> Self {
        Self {
            project_dirs: None,
            override_dir: Some(path.into()),
        }
    }

    /// Get the configuration directory
    pub fn config_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.join("config");
        }

        match &self.project_dirs {
            Some(project_dirs) => project_dirs.config_dir().to_path_buf(),
            None => PathBuf::from("./config"),
        }
    }

    /// Get the data directory for persistent storage
    pub fn data_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.join("data");
        }

        match &self.project_dirs {
            Some(project_dirs) => project_dirs.data_dir().to_path_buf(),
            None => PathBuf::from("./data"),
        }
    }

    /// Config file picked up when `--config` is not given
    pub fn default_config_file(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    /// Where the session is persisted unless configured otherwise
    pub fn session_file(&self) -> PathBuf {
        self.data_dir().join("session.json")
    }
}

impl Default for StateDir {
    fn default() -> Self {
        Self::new()
    }
}
