use bridge_traits::error::BridgeError;
use core_logtree::LogTreeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Log tree error: {0}")]
    LogTree(#[from] LogTreeError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
