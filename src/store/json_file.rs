use crate::core::RateSnapshot;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// The `data.json` file shared with the web app. Each write replaces the
/// previous snapshot entirely.
pub struct JsonSnapshotFile {
    path: PathBuf,
}

impl JsonSnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes pretty-printed UTF-8 JSON, non-ASCII characters unescaped.
    pub fn write(&self, snapshot: &RateSnapshot) -> Result<()> {
        let res: Result<()> = (|| {
            let json =
                serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;

            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }

            fs::write(&self.path, json)
                .with_context(|| format!("Failed to write snapshot to {}", self.path.display()))?;
            Ok(())
        })();

        match res {
            Ok(()) => {
                debug!("Snapshot written to {}", self.path.display());
                Ok(())
            }
            Err(e) => {
                let reason = format!("{e:#}");
                error!(error = %reason, path = %self.path.display(), "Error writing snapshot");
                Err(e)
            }
        }
    }

    pub fn read(&self) -> Result<RateSnapshot> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse snapshot: {}", self.path.display()))
    }
}
