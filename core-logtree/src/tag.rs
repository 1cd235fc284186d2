//! Tag resolution from a call-context snapshot.
//!
//! A [`CallStack`] is an innermost-first list of frames supplied by the
//! caller. The logging macros capture `module_path!()`, [`LogTree::log`]
//! captures the caller's source file through `#[track_caller]`, and the
//! tracing bridge uses the event's module path.
//!
//! [`LogTree::log`]: crate::tree::LogTree::log

use crate::error::{LogTreeError, Result};
use std::panic::Location;
use std::path::Path;

/// Longest tag accepted by platforms that enforce a tag ceiling.
pub const MAX_TAG_LENGTH: usize = 23;

const CLOSURE_SUFFIX: &str = "::{{closure}}";

/// One frame of a call-context snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Fully qualified name of the defining type or module
    pub type_name: String,
}

impl StackFrame {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }

    /// Frame for a source location.
    ///
    /// The file stem names the frame. `mod.rs`, `lib.rs` and `main.rs` are
    /// named after the closest meaningful parent directory instead.
    pub fn from_location(location: &Location<'_>) -> Self {
        Self::new(name_for_source_file(location.file()))
    }
}

/// Innermost-first call-context snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStack {
    frames: Vec<StackFrame>,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: Vec<StackFrame>) -> Self {
        Self { frames }
    }

    /// Single-frame snapshot for a module path such as `module_path!()`.
    pub fn from_module(module_path: &str) -> Self {
        Self::from_frames(vec![StackFrame::new(module_path)])
    }

    /// Single-frame snapshot for the location that called the enclosing
    /// `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_frames(vec![StackFrame::from_location(Location::caller())])
    }

    /// Add an outer frame.
    pub fn push(mut self, frame: StackFrame) -> Self {
        self.frames.push(frame);
        self
    }

    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Resolve the tag for the frame at `depth`.
///
/// # Errors
///
/// Returns [`LogTreeError::StackDepthViolation`] when the snapshot has no
/// frame at `depth`.
pub fn resolve_tag(stack: &CallStack, depth: usize, enforce_limit: bool) -> Result<String> {
    let frame = stack
        .frames
        .get(depth)
        .ok_or(LogTreeError::StackDepthViolation {
            depth,
            available: stack.len(),
        })?;

    Ok(tag_from_type_name(&frame.type_name, enforce_limit))
}

/// Derive a short tag from a fully qualified type name.
///
/// `com.example.Foo$1$2` becomes `Foo`, `core_service::relay::{{closure}}`
/// becomes `relay`.
pub fn tag_from_type_name(type_name: &str, enforce_limit: bool) -> String {
    let trimmed = strip_anonymous_suffix(type_name);

    let start = [
        trimmed.rfind('.').map(|i| i + 1),
        trimmed.rfind("::").map(|i| i + 2),
        trimmed.rfind('/').map(|i| i + 1),
        trimmed.rfind('\\').map(|i| i + 1),
    ]
    .into_iter()
    .flatten()
    .max()
    .unwrap_or(0);

    let tag = &trimmed[start..];

    if enforce_limit && tag.chars().count() > MAX_TAG_LENGTH {
        tag.chars().take(MAX_TAG_LENGTH).collect()
    } else {
        tag.to_string()
    }
}

fn strip_anonymous_suffix(mut name: &str) -> &str {
    loop {
        if let Some(stripped) = name.strip_suffix(CLOSURE_SUFFIX) {
            name = stripped;
            continue;
        }

        match name.rfind('$') {
            Some(pos)
                if pos + 1 < name.len()
                    && name[pos + 1..].bytes().all(|b| b.is_ascii_digit()) =>
            {
                name = &name[..pos];
            }
            _ => return name,
        }
    }
}

fn name_for_source_file(file: &str) -> String {
    let path = Path::new(file);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file);

    if !matches!(stem, "mod" | "lib" | "main") {
        return stem.to_string();
    }

    path.parent()
        .into_iter()
        .flat_map(|p| p.iter().rev())
        .filter_map(|c| c.to_str())
        .find(|c| !matches!(*c, "src" | "bin"))
        .unwrap_or(stem)
        .to_string()
}
