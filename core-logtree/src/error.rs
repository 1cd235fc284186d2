use bridge_traits::error::BridgeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogTreeError {
    #[error("Call stack too shallow: wanted frame {depth}, only {available} available")]
    StackDepthViolation { depth: usize, available: usize },

    #[error("Failed to flush log buffer to {path:?}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: BridgeError,
    },
}

pub type Result<T> = std::result::Result<T, LogTreeError>;
