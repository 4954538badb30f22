//! Compiled route table persistence.
//!
//! # Responsibilities
//! - Load a previously compiled table, rejecting anything that does not
//!   validate
//! - Store a table so that readers only ever see a complete file
//!
//! # File Format
//! ```text
//! { "format_version": 1, "checksum": "<sha256 of table JSON>", "table": {...} }
//! ```
//!
//! # Design Decisions
//! - Loading never fails: unreadable or invalid content is a miss
//! - Writes go to a temp file in the cache directory, then rename over the
//!   target (last writer wins, content is deterministic)
//! - Repositories are injected into the resolver so tests can use the
//!   in-memory one

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::config::CacheConfig;
use crate::routing::router::CompiledRouteTable;

/// Version of the persisted envelope.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Error type for cache persistence.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize route table: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid cache content: {0}")]
    Invalid(String),
}

/// Storage for a compiled route table.
pub trait RouteCacheRepository: Send + Sync + std::fmt::Debug {
    /// Returns the stored table, or `None` if it is absent or invalid.
    fn load(&self) -> Option<CompiledRouteTable>;

    /// Replace the stored table.
    fn store(&self, table: &CompiledRouteTable) -> Result<(), CacheError>;

    /// Remove the stored table. Removing an absent table succeeds.
    fn clear(&self) -> Result<(), CacheError>;
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    checksum: String,
    table: &'a CompiledRouteTable,
}

#[derive(Deserialize)]
struct Envelope {
    format_version: u32,
    checksum: String,
    table: CompiledRouteTable,
}

fn checksum(table: &CompiledRouteTable) -> Result<String, CacheError> {
    let bytes = serde_json::to_vec(table)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Serialize a table into the cache envelope.
pub fn encode(table: &CompiledRouteTable) -> Result<Vec<u8>, CacheError> {
    let envelope = EnvelopeRef {
        format_version: CACHE_FORMAT_VERSION,
        checksum: checksum(table)?,
        table,
    };
    Ok(serde_json::to_vec_pretty(&envelope)?)
}

/// Parse and verify a cache envelope.
pub fn decode(bytes: &[u8]) -> Result<CompiledRouteTable, CacheError> {
    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(|e| CacheError::Invalid(e.to_string()))?;

    if envelope.format_version != CACHE_FORMAT_VERSION {
        return Err(CacheError::Invalid(format!(
            "format version {} (expected {})",
            envelope.format_version, CACHE_FORMAT_VERSION
        )));
    }

    let expected = checksum(&envelope.table)?;
    if envelope.checksum != expected {
        return Err(CacheError::Invalid("checksum mismatch".into()));
    }

    Ok(envelope.table)
}

/// Table cache kept in a single file.
#[derive(Debug, Clone)]
pub struct FileRouteCache {
    path: PathBuf,
}

impl FileRouteCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn io_error(&self, path: &Path, source: io::Error) -> CacheError {
        CacheError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl RouteCacheRepository for FileRouteCache {
    fn load(&self) -> Option<CompiledRouteTable> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Route cache file not found");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Route cache file unreadable");
                return None;
            }
        };

        match decode(&bytes) {
            Ok(table) => Some(table),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring invalid route cache file");
                None
            }
        }
    }

    fn store(&self, table: &CompiledRouteTable) -> Result<(), CacheError> {
        let bytes = encode(table)?;
        let dir = self.directory();
        fs::create_dir_all(dir).map_err(|e| self.io_error(dir, e))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(dir, e))?;
        temp.write_all(&bytes)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| self.io_error(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| self.io_error(&self.path, e.error))?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "Route cache file written");
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(&self.path, e)),
        }
    }
}

/// In-memory cache holding the encoded bytes, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryRouteCache {
    slot: Mutex<Option<Vec<u8>>>,
    loads: AtomicUsize,
    stores: AtomicUsize,
}

impl MemoryRouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored bytes, valid or not.
    pub fn seed_raw(&self, bytes: impl Into<Vec<u8>>) {
        *self.lock() = Some(bytes.into());
    }

    pub fn raw(&self) -> Option<Vec<u8>> {
        self.lock().clone()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Vec<u8>>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RouteCacheRepository for MemoryRouteCache {
    fn load(&self) -> Option<CompiledRouteTable> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        let bytes = self.lock().clone()?;
        match decode(&bytes) {
            Ok(table) => Some(table),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid in-memory route cache");
                None
            }
        }
    }

    fn store(&self, table: &CompiledRouteTable) -> Result<(), CacheError> {
        let bytes = encode(table)?;
        self.stores.fetch_add(1, Ordering::Relaxed);
        *self.lock() = Some(bytes);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        *self.lock() = None;
        Ok(())
    }
}
