//! Append-only wiretap file sink with per-file locking.
//!
//! [`EventLog`] maps each retained [`Event`] to the file for
//! `(today, device id)`, creates that file with its header on first use,
//! and appends one synced record line per event. Writers targeting the
//! same file are serialized through a [`tokio::sync::Mutex`] kept per
//! [`LogFileKey`]; writers targeting different files never contend.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use super::file_key::LogFileKey;
use super::record::{HEADER, LogRecord};
use crate::domain::{Clock, Event};
use crate::error::WiretapError;

/// Durable per-device, per-day event sink.
///
/// # Concurrency
///
/// - Appends to different files proceed concurrently.
/// - Appends to the same file are serialized, so the header is written
///   exactly once and records land in lock-acquisition order.
/// - Lock entries for past dates are pruned when a later date is first
///   seen, unless a writer still holds or awaits them.
#[derive(Debug)]
pub struct EventLog {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    locks: RwLock<HashMap<LogFileKey, Arc<Mutex<()>>>>,
}

impl EventLog {
    /// Creates a sink writing into `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`WiretapError::WriteFailure`] if `dir` cannot be created.
    pub async fn open(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, WiretapError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| WiretapError::WriteFailure {
                path: dir.clone(),
                source,
            })?;
        Ok(Self {
            dir,
            clock,
            locks: RwLock::new(HashMap::new()),
        })
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Key the next append for `event` would target.
    #[must_use]
    pub fn key_for(&self, event: &Event) -> LogFileKey {
        LogFileKey::new(self.clock.now().date(), event.device_id().clone())
    }

    /// Full path of the file for `key`.
    #[must_use]
    pub fn path_for(&self, key: &LogFileKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Appends `event` to its device's file for today, returning the path.
    ///
    /// The record is flushed and synced before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`WiretapError::WriteFailure`] if the file cannot be
    /// created, opened, written, or synced.
    pub async fn append(&self, event: &Event) -> Result<PathBuf, WiretapError> {
        let key = self.key_for(event);
        let path = self.path_for(&key);
        let lock = self.lock_for(&key).await;
        let _guard = lock.lock().await;

        let write_failure = |source: std::io::Error| WiretapError::WriteFailure {
            path: path.clone(),
            source,
        };

        let mut file = self.open_with_header(&path).await.map_err(write_failure)?;
        let line = LogRecord::new(event.received_at(), event.payload().clone()).to_line();
        file.write_all(line.as_bytes())
            .await
            .map_err(write_failure)?;
        file.flush().await.map_err(write_failure)?;
        file.sync_data().await.map_err(write_failure)?;

        tracing::info!(device_id = %event.device_id(), file = %path.display(), "event written");
        Ok(path)
    }

    /// Opens `path` for appending, creating it with the header if absent.
    ///
    /// A file that exists but is empty gets the header before any record.
    /// A file this call created is removed again if its header cannot be
    /// written, so the next attempt starts from scratch.
    async fn open_with_header(&self, path: &Path) -> std::io::Result<File> {
        match OpenOptions::new()
            .append(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(mut file) => {
                if let Err(err) = write_header(&mut file).await {
                    drop(file);
                    if let Err(cleanup) = fs::remove_file(path).await {
                        tracing::warn!(
                            file = %path.display(),
                            error = %cleanup,
                            "could not remove file after failed header write"
                        );
                    }
                    return Err(err);
                }
                tracing::info!(file = %path.display(), "log file created");
                Ok(file)
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                let mut file = OpenOptions::new().append(true).open(path).await?;
                if file.metadata().await?.len() == 0 {
                    write_header(&mut file).await?;
                    tracing::warn!(file = %path.display(), "empty log file found, header restored");
                }
                Ok(file)
            }
            Err(err) => Err(err),
        }
    }

    /// Returns the lock guarding `key`, inserting one if needed.
    ///
    /// Inserting a key prunes entries for earlier dates that no task is
    /// holding.
    async fn lock_for(&self, key: &LogFileKey) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(key) {
            return Arc::clone(lock);
        }
        let mut map = self.locks.write().await;
        if !map.contains_key(key) {
            // Clones are only taken under the map lock, so a count of one
            // means no writer holds or waits on this entry.
            map.retain(|existing, lock| {
                existing.date >= key.date || Arc::strong_count(lock) > 1
            });
        }
        Arc::clone(map.entry(key.clone()).or_default())
    }

    /// Number of file keys with a live lock entry.
    pub async fn tracked_files(&self) -> usize {
        self.locks.read().await.len()
    }
}

async fn write_header(file: &mut File) -> std::io::Result<()> {
    file.write_all(format!("{HEADER}\n").as_bytes()).await?;
    file.flush().await
}
