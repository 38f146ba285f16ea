//! Shared cache of static file contents.
//!
//! All connections share one [`FileCache`]. A miss reads the file from disk
//! and stores its bytes; hits never touch the filesystem. Invalidation is
//! wholesale: one background ticker, started on the first insert, swaps the
//! whole map for an empty one every `ttl`. A zero `ttl` keeps entries for the
//! life of the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::time::{Instant, interval_at};
use tracing::debug;

use crate::config::CacheConfig;

type Entries = RwLock<HashMap<PathBuf, Bytes>>;

#[derive(Debug)]
pub struct FileCache {
    entries: Arc<Entries>,
    enabled: bool,
    ttl: Duration,
    ticker_started: AtomicBool,
    disk_reads: AtomicU64,
}

impl FileCache {
    pub fn new(enabled: bool, ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            enabled,
            ttl,
            ticker_started: AtomicBool::new(false),
            disk_reads: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.enabled, Duration::from_secs(config.ttl_secs))
    }

    /// Returns the bytes of `path`, reading the file only on a miss.
    ///
    /// Any I/O error (missing file, directory, permissions) is returned to
    /// the caller, which answers 404.
    pub async fn get(&self, path: &Path) -> std::io::Result<Bytes> {
        if self.enabled {
            if let Some(hit) = self.entries.read().await.get(path) {
                debug!(path = %path.display(), "file cache hit");
                return Ok(hit.clone());
            }
        }

        let contents = Bytes::from(tokio::fs::read(path).await?);
        self.disk_reads.fetch_add(1, Ordering::Relaxed);

        if self.enabled {
            self.entries
                .write()
                .await
                .insert(path.to_path_buf(), contents.clone());
            debug!(path = %path.display(), bytes = contents.len(), "file cached");
            self.ensure_ticker();
        }

        Ok(contents)
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        *self.entries.write().await = HashMap::new();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Number of times a file was actually read from disk.
    pub fn disk_reads(&self) -> u64 {
        self.disk_reads.load(Ordering::Relaxed)
    }

    fn ensure_ticker(&self) {
        if self.ttl.is_zero() || self.ticker_started.swap(true, Ordering::AcqRel) {
            return;
        }
        tokio::spawn(invalidate_periodically(Arc::downgrade(&self.entries), self.ttl));
    }
}

async fn invalidate_periodically(entries: Weak<Entries>, ttl: Duration) {
    let mut ticker = interval_at(Instant::now() + ttl, ttl);
    loop {
        ticker.tick().await;

        // Cache dropped, nothing left to invalidate.
        let Some(entries) = entries.upgrade() else {
            break;
        };

        let mut guard = entries.write().await;
        let dropped = guard.len();
        *guard = HashMap::new();
        debug!(dropped, "file cache invalidated");
    }
}
