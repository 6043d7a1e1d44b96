use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono_tz::Tz;
use futures::future::join_all;
use tokio::sync::Mutex;
use votewatch_core::record::{KEY_PREFIX, record_key};
use votewatch_core::{
    RejectedRecord, Snapshot, SnapshotRecord, SnapshotStore, StoreScan, VoteError,
};

use super::unique_key;

const EXTENSION: &str = ".json";

/// Directory of JSON records, one file per successful cycle.
///
/// Files are named `vote_YYYYMMDD_HHMMSS.json` in the store's timezone, with a
/// numeric suffix when two captures share a second. Each record is written to
/// a hidden temporary file and renamed into place, so readers never see a
/// partial record. Existing files are never rewritten.
pub struct DirStore {
    dir: PathBuf,
    tz: Tz,
    append_lock: Mutex<()>,
}

impl DirStore {
    /// Store rooted at `dir`; the directory is created on first append.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            dir: dir.into(),
            tz,
            append_lock: Mutex::new(()),
        }
    }

    /// Store rooted at `dir`, creating the directory now.
    ///
    /// # Errors
    /// Returns `Store` when the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>, tz: Tz) -> Result<Self, VoteError> {
        let store = Self::new(dir, tz);
        tokio::fs::create_dir_all(&store.dir)
            .await
            .map_err(|e| store_err(&store.dir, &e))?;
        Ok(store)
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn record_names(&self) -> Result<Vec<String>, VoteError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(store_err(&self.dir, &e)),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| store_err(&self.dir, &e))?
        {
            if let Some(name) = entry.file_name().to_str()
                && is_record_name(name)
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn read_record(&self, name: &str) -> Result<Snapshot, VoteError> {
        let path = self.dir.join(name);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| store_err(&path, &e))?;
        SnapshotRecord::from_json(&bytes)?.into_snapshot(Some(name), self.tz)
    }
}

fn is_record_name(name: &str) -> bool {
    name.starts_with(KEY_PREFIX) && name.ends_with(EXTENSION)
}

fn store_err(path: &Path, e: &std::io::Error) -> VoteError {
    VoteError::store(format!("{}: {e}", path.display()))
}

#[async_trait]
impl SnapshotStore for DirStore {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "votewatch::store::append", skip_all, fields(dir = %self.dir.display()))
    )]
    async fn append(&self, snapshot: &Snapshot) -> Result<String, VoteError> {
        let bytes = SnapshotRecord::from_snapshot(snapshot, self.tz).to_json()?;
        let _guard = self.append_lock.lock().await;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| store_err(&self.dir, &e))?;
        let existing: HashSet<String> = self.record_names().await?.into_iter().collect();
        let base = record_key(snapshot.captured_at, self.tz);
        let key = unique_key(&base, |k| existing.contains(&format!("{k}{EXTENSION}")));
        let name = format!("{key}{EXTENSION}");

        let tmp = self.dir.join(format!(".{name}.tmp"));
        let path = self.dir.join(&name);
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| store_err(&tmp, &e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(store_err(&path, &e));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(file = %name, candidates = snapshot.percentages.len(), "record written");
        Ok(name)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "votewatch::store::load_all", skip_all, fields(dir = %self.dir.display()))
    )]
    async fn load_all(&self) -> Result<StoreScan, VoteError> {
        let names = self.record_names().await?;
        let results = join_all(names.iter().map(|name| self.read_record(name))).await;

        let mut scan = StoreScan::default();
        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(snapshot) => scan.snapshots.push(snapshot),
                Err(error) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(file = %name, error = %error, "skipping malformed record");
                    scan.rejected.push(RejectedRecord { key: name, error });
                }
            }
        }
        Ok(scan)
    }
}
