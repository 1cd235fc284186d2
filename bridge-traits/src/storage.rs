//! Storage Abstractions
//!
//! The log tree only ever needs two filesystem operations, so the contract is
//! kept that small. Hosts with sandboxed storage (scoped storage on Android,
//! app containers on iOS) implement it against their own APIs.

use std::path::Path;

use crate::error::Result;

/// Append-only file storage used for local log persistence.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::LogStorage;
///
/// fn persist(storage: &dyn LogStorage, dir: &Path, bytes: &[u8]) -> Result<()> {
///     storage.create_dir_all(dir)?;
///     storage.append_file(&dir.join("log.txt"), bytes)
/// }
/// ```
pub trait LogStorage: Send + Sync {
    /// Create a directory and all parent directories if they don't exist
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Append `data` to the file at `path`, creating it if absent.
    ///
    /// The write is all-or-error: implementations must not report success for
    /// a partial write.
    fn append_file(&self, path: &Path, data: &[u8]) -> Result<()>;
}
