//! # Log Tree
//!
//! Diagnostic logging facility of the mobile core.
//!
//! ## Overview
//!
//! This crate provides:
//! - A dispatcher ([`LogTree`]) that routes every log call to the host's
//!   platform log under one facility tag
//! - Tag resolution from a call-context snapshot
//! - Chunking of messages too long for the platform log
//! - A local buffer flushed to hour-bucketed files on a time/size policy
//!
//! ## Usage
//!
//! ```ignore
//! use core_logtree::{d, e, LogTree};
//! use core_runtime::config::LogTreeConfig;
//!
//! let tree = LogTree::new(LogTreeConfig::builder().build()?)?;
//!
//! d!(tree, "scan found {} files", 12);
//! e!(tree, cause = &err, "upload of {} failed", name);
//! ```
//!
//! The macros name the tag prefix after the calling module. `LogTree` also
//! implements [`LoggerSink`](bridge_traits::logging::LoggerSink), so
//! `tracing` events can be mirrored into it through
//! `core_runtime::logging::LoggerSinkLayer`.

pub mod chunk;
pub mod error;
pub mod flush;
pub mod tag;
pub mod tree;

pub use bridge_traits::logging::LogPriority;
pub use error::{LogTreeError, Result};
pub use flush::{FlushEngine, FlushOutcome, FlushStats};
pub use tag::{CallStack, StackFrame};
pub use tree::LogTree;

/// Log at `priority` with the calling module as the tag source.
///
/// Prefer the level macros ([`v!`], [`d!`], [`i!`], [`w!`], [`e!`], [`wtf!`]).
#[macro_export]
macro_rules! tree_log {
    ($tree:expr, $priority:expr, cause = $cause:expr, $($arg:tt)+) => {
        $tree.log_with_stack(
            $priority,
            &$crate::tag::CallStack::from_module(module_path!()),
            &format!($($arg)+),
            Some($cause as &(dyn ::std::error::Error + 'static)),
        )
    };
    ($tree:expr, $priority:expr, $($arg:tt)+) => {
        $tree.log_with_stack(
            $priority,
            &$crate::tag::CallStack::from_module(module_path!()),
            &format!($($arg)+),
            None,
        )
    };
}

#[macro_export]
macro_rules! v {
    ($tree:expr, cause = $cause:expr, $($arg:tt)+) => {
        $crate::tree_log!($tree, $crate::LogPriority::Verbose, cause = $cause, $($arg)+)
    };
    ($tree:expr, $($arg:tt)+) => {
        $crate::tree_log!($tree, $crate::LogPriority::Verbose, $($arg)+)
    };
}

#[macro_export]
macro_rules! d {
    ($tree:expr, cause = $cause:expr, $($arg:tt)+) => {
        $crate::tree_log!($tree, $crate::LogPriority::Debug, cause = $cause, $($arg)+)
    };
    ($tree:expr, $($arg:tt)+) => {
        $crate::tree_log!($tree, $crate::LogPriority::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! i {
    ($tree:expr, cause = $cause:expr, $($arg:tt)+) => {
        $crate::tree_log!($tree, $crate::LogPriority::Info, cause = $cause, $($arg)+)
    };
    ($tree:expr, $($arg:tt)+) => {
        $crate::tree_log!($tree, $crate::LogPriority::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! w {
    ($tree:expr, cause = $cause:expr, $($arg:tt)+) => {
        $crate::tree_log!($tree, $crate::LogPriority::Warn, cause = $cause, $($arg)+)
    };
    ($tree:expr, $($arg:tt)+) => {
        $crate::tree_log!($tree, $crate::LogPriority::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! e {
    ($tree:expr, cause = $cause:expr, $($arg:tt)+) => {
        $crate::tree_log!($tree, $crate::LogPriority::Error, cause = $cause, $($arg)+)
    };
    ($tree:expr, $($arg:tt)+) => {
        $crate::tree_log!($tree, $crate::LogPriority::Error, $($arg)+)
    };
}

/// Log to the fatal sink. Never buffered.
#[macro_export]
macro_rules! wtf {
    ($tree:expr, cause = $cause:expr, $($arg:tt)+) => {
        $crate::tree_log!($tree, $crate::LogPriority::Assert, cause = $cause, $($arg)+)
    };
    ($tree:expr, $($arg:tt)+) => {
        $crate::tree_log!($tree, $crate::LogPriority::Assert, $($arg)+)
    };
}
