use crate::config::types::{CONFIG_FILE_NAME, Config, REPO_DIR_NAME};
use crate::error::{IngestError, Result};
use crate::tools::host_cpu_count;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

impl Config {
    #[must_use]
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(REPO_DIR_NAME).join(CONFIG_FILE_NAME)
    }

    /// Loads `<root>/.ova-repo/configs.json`, falling back to defaults when the
    /// file is absent or empty. Missing keys take their default values.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path_in(root);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(IngestError::io(&path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content)
            .map_err(|e| IngestError::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// Effective worker count.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.concurrency
            .filter(|&n| n > 0)
            .unwrap_or_else(host_cpu_count)
    }
}
