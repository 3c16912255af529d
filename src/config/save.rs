use crate::config::types::Config;
use crate::error::{IngestError, Result};
use crate::tools::write_atomic;
use std::path::Path;

impl Config {
    pub fn save(&self, root: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| IngestError::Config(format!("cannot serialize settings: {e}")))?;
        write_atomic(&Self::path_in(root), content.as_bytes())
    }
}
