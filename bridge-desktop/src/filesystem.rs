//! Log Storage Implementation using `std::fs`

use bridge_traits::{
    error::{BridgeError, Result},
    storage::LogStorage,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name used under the platform data directory.
const LOG_DIR_NAME: &str = "OpacitySDKLog";

/// Default root for local log files on desktop.
///
/// Resolves to `<local data dir>/OpacitySDKLog`, falling back to the system
/// temp directory when no data directory is known.
pub fn default_log_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(LOG_DIR_NAME)
}

/// Blocking file system implementation
///
/// The log tree flushes synchronously on the logging thread, so this
/// implementation deliberately uses `std::fs` rather than an async runtime.
#[derive(Debug, Clone, Default)]
pub struct StdFileSystem;

impl StdFileSystem {
    pub fn new() -> Self {
        Self
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

impl LogStorage for StdFileSystem {
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(path).map_err(Self::map_io_error)?;
        debug!(path = ?path, "Created directory");
        Ok(())
    }

    fn append_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(Self::map_io_error)?;

        file.write_all(data).map_err(Self::map_io_error)?;
        file.flush().map_err(Self::map_io_error)?;

        debug!(path = ?path, size = data.len(), "Appended to file");
        Ok(())
    }
}
