//! One JSON file per draft slot under a directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error};

use menu_core::error::MenuError;
use menu_core::repositories::DraftStorage;

pub struct FileDraftStorage {
    dir: PathBuf,
}

impl FileDraftStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{dir}/{key}.json`, with characters unsafe in file names replaced.
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

fn storage_error(context: &str, path: &Path, e: std::io::Error) -> MenuError {
    error!("Draft storage error {} {}: {}", context, path.display(), e);
    MenuError::Storage(e.to_string())
}

#[async_trait]
impl DraftStorage for FileDraftStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, MenuError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("reading", &path, e)),
        }
    }

    /// Writes to a temporary file first so a crash never leaves a torn draft.
    async fn write(&self, key: &str, value: &str) -> Result<(), MenuError> {
        let path = self.path_for(key);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_error("creating", &self.dir, e))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| storage_error("writing", &tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage_error("replacing", &path, e))?;

        debug!("Draft slot {} written to {}", key, path.display());
        Ok(())
    }
}
