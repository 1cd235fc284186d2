//! Log tree demonstration
//!
//! Runs the core with the desktop bridges. Host log lines go through
//! `tracing` to stderr and to hour-bucketed files under the platform data
//! directory. SDK events are printed to stdout as JSON lines.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run -p core-service --example log_tree_demo
//!
//! # JSON format, custom log directory
//! cargo run -p core-service --example log_tree_demo -- json /tmp/opacity-logs
//! ```

use anyhow::{Context, Result};
use bridge_desktop::TracingPlatformLog;
use bridge_traits::logging::LogPriority;
use core_logtree::{d, e, i, w};
use core_runtime::config::LogTreeConfig;
use core_runtime::events::{ScanStatus, SdkEvent};
use core_runtime::logging::{strip_path, LogFormat, LoggingConfig};
use core_service::CoreService;
use serde_json::json;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };
    let log_root = args
        .get(2)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(bridge_desktop::default_log_root);

    // Host log lines join the core's own tracing output
    let config = LogTreeConfig::builder()
        .platform_log(Arc::new(TracingPlatformLog::new()))
        .build()?;
    let service = CoreService::builder()
        .log_tree_config(config)
        .build()
        .context("Failed to build core service")?;

    service
        .install_tracing(
            LoggingConfig::default()
                .with_format(format)
                .with_level(LogPriority::Debug),
        )
        .context("Failed to initialize logging")?;

    // What the host sends through setConfig on launch
    let applied = service.apply_settings(json!({
        "cloudLog": false,
        "localLog": true,
        "logDirectory": log_root,
        "appIdentifier": "com.opacity.demo"
    }))?;
    info!(root = ?applied.log_directory, "Local logging enabled");

    service.spawn_event_relay();
    let tree = service.log_tree();

    i!(tree, "scan requested by host");
    d!(tree, "watching {} storage volumes", 2);

    let bus = service.event_bus();
    bus.emit(SdkEvent::ScanStatus {
        status: ScanStatus::Running,
    })
    .ok();
    for (idx, path) in ["/DCIM/Camera/IMG_0001.jpg", "/DCIM/Camera/IMG_0002.jpg"]
        .iter()
        .enumerate()
    {
        d!(tree, "found {}", strip_path(path));
        bus.emit(SdkEvent::FileChanged {
            path: path.to_string(),
            size: 1_024 * (idx as u64 + 1),
        })
        .ok();
    }
    bus.emit(SdkEvent::ScanStatus {
        status: ScanStatus::Finished,
    })
    .ok();

    let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "SD card is read-only");
    e!(tree, cause = &err, "could not index removable storage");
    w!(tree, "{}", "x".repeat(9_000));

    warn!(files = 2, "Core event mirrored into the log tree");

    tokio::time::sleep(Duration::from_millis(50)).await;

    let outcome = service.shutdown()?;
    info!(?outcome, stats = ?tree.stats(), "Demo complete");
    Ok(())
}
