//! Snapshot cache for per-channel video lists
//!
//! Stores one JSON file per channel key, each holding the full video list
//! and the time it was fetched. Freshness is evaluated against a fixed
//! one-hour TTL; a snapshot whose age equals the TTL is already stale.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::data::Video;

/// How long a snapshot is served as primary data, in seconds
const CACHE_TTL_SECS: i64 = 60 * 60;

/// The snapshot TTL as a [`Duration`]
pub fn cache_ttl() -> Duration {
    Duration::seconds(CACHE_TTL_SECS)
}

/// Errors that can occur when reading a snapshot
///
/// Never shown to clients; the request handler maps any of these to its
/// own fallback or terminal response.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No snapshot file exists for the key
    #[error("no cached snapshot for channel key '{0}'")]
    Missing(String),

    /// The snapshot file exists but cannot be parsed
    #[error("cached snapshot for channel key '{0}' is unreadable: {1}")]
    Unreadable(String, String),
}

/// On-disk snapshot format: the full video list plus its fetch time
///
/// Each successful refresh replaces the whole snapshot; snapshots are
/// never merged or appended to.
#[derive(Debug, Serialize, Deserialize)]
struct CachedSnapshot {
    /// When the videos were fetched
    timestamp: DateTime<Utc>,
    /// The channel's videos, in upstream search order
    videos: Vec<Video>,
}

/// Manages reading and writing channel snapshots to disk
///
/// One JSON file per normalized channel key. There is no locking:
/// concurrent writers for the same key race and the last full overwrite
/// wins, which is acceptable for a workload that writes at most once per
/// TTL window per channel.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    /// Directory where snapshot files are stored
    cache_dir: PathBuf,
}

impl SnapshotCache {
    /// Creates a SnapshotCache using the XDG-compliant cache directory
    ///
    /// Uses `~/.cache/tinytunes/` on Linux, or the platform equivalent.
    /// Returns `None` if no cache directory can be determined (e.g., no
    /// home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "tinytunes")?;
        Some(Self {
            cache_dir: project_dirs.cache_dir().to_path_buf(),
        })
    }

    /// Creates a SnapshotCache with a custom directory
    ///
    /// Used in tests and on hosts where only a fixed scratch path (such as
    /// `/tmp`) is writable.
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// The directory snapshot files are stored in
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the snapshot file path for the given channel key
    fn snapshot_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("videos-{}.json", key))
    }

    /// Reports whether a fresh snapshot exists for the key
    ///
    /// Missing files, unreadable files, and snapshots at least one TTL old
    /// all count as not fresh. This never fails: corruption here is
    /// staleness, not an error.
    pub async fn is_fresh(&self, key: &str) -> bool {
        match self.read_snapshot(key).await {
            Ok(snapshot) => {
                let age = Utc::now() - snapshot.timestamp;
                debug!(
                    key,
                    age_secs = age.num_seconds(),
                    ttl_secs = CACHE_TTL_SECS,
                    "checked snapshot age"
                );
                age < cache_ttl()
            }
            Err(err) => {
                debug!(key, %err, "no fresh snapshot");
                false
            }
        }
    }

    /// Reads the stored video list for the key, regardless of freshness
    ///
    /// # Errors
    /// * [`CacheError::Missing`] - no snapshot file exists
    /// * [`CacheError::Unreadable`] - the file exists but is not a valid
    ///   snapshot
    pub async fn read(&self, key: &str) -> Result<Vec<Video>, CacheError> {
        Ok(self.read_snapshot(key).await?.videos)
    }

    /// Replaces the snapshot for the key with the given videos, stamped now
    ///
    /// Writes to a temporary file and renames it into place, so readers
    /// never observe a half-written snapshot.
    pub async fn write(&self, key: &str, videos: &[Video]) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir).await?;

        let snapshot = CachedSnapshot {
            timestamp: Utc::now(),
            videos: videos.to_vec(),
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let path = self.snapshot_path(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).await?;
        if let Err(err) = fs::rename(&tmp_path, &path).await {
            warn!(key, %err, "failed to move snapshot into place");
            return Err(err);
        }

        debug!(key, path = %path.display(), "snapshot written");
        Ok(())
    }

    /// Reads and parses the raw snapshot file
    async fn read_snapshot(&self, key: &str) -> Result<CachedSnapshot, CacheError> {
        let path = self.snapshot_path(key);
        let content = fs::read_to_string(&path)
            .await
            .map_err(|_| CacheError::Missing(key.to_string()))?;

        serde_json::from_str(&content)
            .map_err(|e| CacheError::Unreadable(key.to_string(), e.to_string()))
    }
}
