// src/store/file.rs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

use crate::errors::{GanttError, Result};
use crate::model::GanttDocument;

use super::{ScheduleStore, StoreFuture, empty_payload};

/// One pretty-printed JSON file per group: `<dir>/<group>.json`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash never leaves a half-written document behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `group`.
    ///
    /// `[A-Za-z0-9-]` is kept as is; every other byte, `_` included, becomes
    /// `_xx` (lowercase hex). Distinct groups therefore never share a file.
    /// The empty group maps to `_.json`, which no escape can produce.
    pub fn path_for(&self, group: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(group)))
    }

    async fn read(&self, group: &str) -> Result<Value> {
        let path = self.path_for(group);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(group, path = %path.display(), "no stored schedule; starting empty");
                return Ok(empty_payload());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&contents) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(group, path = %path.display(), error = %e, "stored schedule is not valid JSON; starting empty");
                Ok(empty_payload())
            }
        }
    }

    async fn write(&self, group: &str, document: &GanttDocument) -> Result<()> {
        let persist_failure = |reason: String| GanttError::StorePersistFailure {
            group: group.to_string(),
            reason,
        };

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| persist_failure(format!("creating {}: {e}", self.dir.display())))?;

        let path = self.path_for(group);
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(document)?;

        fs::write(&tmp, data.as_bytes())
            .await
            .map_err(|e| persist_failure(format!("writing {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| persist_failure(format!("renaming into {}: {e}", path.display())))?;

        debug!(
            group,
            path = %path.display(),
            tasks = document.tasks.len(),
            links = document.links.len(),
            "saved schedule"
        );
        Ok(())
    }
}

fn file_stem(group: &str) -> String {
    if group.is_empty() {
        return "_".to_string();
    }
    let mut stem = String::with_capacity(group.len());
    for byte in group.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{byte:02x}"));
        }
    }
    stem
}

impl ScheduleStore for FileStore {
    fn load<'a>(&'a self, group: &'a str) -> StoreFuture<'a, Value> {
        Box::pin(self.read(group))
    }

    fn save<'a>(&'a self, group: &'a str, document: &'a GanttDocument) -> StoreFuture<'a, ()> {
        Box::pin(self.write(group, document))
    }
}
