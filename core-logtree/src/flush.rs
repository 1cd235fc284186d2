//! Local log buffer and its flush policy.
//!
//! Lines are stamped and accumulated in memory. A flush writes the whole
//! buffer to `<root>/<app identifier>/<yyyy-MM-dd>(<hhAM|PM>)_opacity_sdk_log.txt`
//! and happens when the minimum interval since the last flush has elapsed or
//! the buffer has grown past its byte limit.
//!
//! Buffer, last flush time and settings sit behind one mutex, and the write
//! itself runs while it is held. Appends therefore never interleave with a
//! flush, at the cost of blocking concurrent log calls for the duration of
//! the write.
//!
//! A storage bridge may log while the engine writes through it. Such a line
//! arrives on the thread that already holds the lock; it is not buffered and
//! the append reports [`FlushOutcome::Reentrant`] instead of blocking.

use crate::error::{LogTreeError, Result};

use bridge_traits::storage::LogStorage;
use bridge_traits::time::Clock;
use chrono::{DateTime, Duration, Local, Utc};
use core_runtime::config::LocalLogSettings;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Suffix of every local log file name.
pub const LOG_FILE_SUFFIX: &str = "_opacity_sdk_log.txt";

const BUCKET_FORMAT: &str = "%Y-%m-%d(%I%p)";
const LINE_TIME_FORMAT: &str = "%I:%M:%S%.3f";

/// What an append or a forced flush did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Local logging is off or has no root directory.
    Disabled,
    /// Buffered, flush policy not met (or nothing to write).
    Buffered,
    /// Buffer written to `path`.
    Flushed { path: PathBuf, bytes: usize },
    /// Logged from inside this engine's own critical section on the same
    /// thread, typically by the storage bridge. Not buffered.
    Reentrant,
}

/// Snapshot of the engine's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub flushes: u64,
    pub failed_flushes: u64,
    pub bytes_written: u64,
    pub bytes_evicted: u64,
}

#[derive(Debug, Default)]
struct Counters {
    flushes: AtomicU64,
    failed_flushes: AtomicU64,
    bytes_written: AtomicU64,
    bytes_evicted: AtomicU64,
}

#[derive(Debug)]
struct FlushState {
    buffer: String,
    /// Byte length of each stamped entry in `buffer`, oldest first.
    entries: VecDeque<usize>,
    last_flush: DateTime<Utc>,
    settings: LocalLogSettings,
}

impl FlushState {
    fn push(&mut self, entry: String) {
        self.entries.push_back(entry.len());
        self.buffer.push_str(&entry);
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.entries.clear();
    }
}

thread_local! {
    /// Engines whose lock the current thread holds.
    static HELD_ENGINES: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Engine lock that remembers, per thread, that it is held.
struct EngineLock<'a> {
    state: MutexGuard<'a, FlushState>,
    engine_id: usize,
}

impl Deref for EngineLock<'_> {
    type Target = FlushState;

    fn deref(&self) -> &FlushState {
        &self.state
    }
}

impl DerefMut for EngineLock<'_> {
    fn deref_mut(&mut self) -> &mut FlushState {
        &mut self.state
    }
}

impl Drop for EngineLock<'_> {
    fn drop(&mut self) {
        HELD_ENGINES.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|&id| id == self.engine_id) {
                held.remove(pos);
            }
        });
    }
}

/// Owner of the local log buffer.
pub struct FlushEngine {
    state: Mutex<FlushState>,
    storage: Arc<dyn LogStorage>,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl FlushEngine {
    /// Create an engine. The last flush starts at the Unix epoch, so the
    /// first append always flushes.
    pub fn new(
        settings: LocalLogSettings,
        storage: Arc<dyn LogStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Mutex::new(FlushState {
                buffer: String::new(),
                entries: VecDeque::new(),
                last_flush: DateTime::<Utc>::UNIX_EPOCH,
                settings,
            }),
            storage,
            clock,
            counters: Counters::default(),
        }
    }

    fn engine_id(&self) -> usize {
        self as *const Self as usize
    }

    fn held_by_current_thread(&self) -> bool {
        let id = self.engine_id();
        HELD_ENGINES.with(|held| held.borrow().contains(&id))
    }

    fn lock(&self) -> EngineLock<'_> {
        // The buffer only ever holds complete lines, so a poisoned lock is
        // still consistent.
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let engine_id = self.engine_id();
        HELD_ENGINES.with(|held| held.borrow_mut().push(engine_id));
        EngineLock { state, engine_id }
    }

    /// Stamp and buffer `line`, then flush if the policy says so.
    ///
    /// A failed flush leaves the buffer and the last flush time untouched.
    /// The error is returned for the fault channel only; the line is kept
    /// either way.
    pub fn append(&self, line: &str) -> Result<FlushOutcome> {
        if self.held_by_current_thread() {
            return Ok(FlushOutcome::Reentrant);
        }

        let mut state = self.lock();
        if state.settings.local_root().is_none() {
            return Ok(FlushOutcome::Disabled);
        }

        let now = self.clock.now();
        state.push(format_line(now, line));

        let interval = Duration::milliseconds(
            i64::try_from(state.settings.min_flush_interval_ms).unwrap_or(i64::MAX),
        );
        let due = now - state.last_flush >= interval
            || state.buffer.len() > state.settings.buffer_byte_limit;

        let outcome = if due {
            self.write_buffer(&mut state, now)
        } else {
            Ok(FlushOutcome::Buffered)
        };

        if outcome.is_err() {
            self.enforce_hard_cap(&mut state);
        }
        outcome
    }

    /// Write the buffer now, ignoring the flush policy.
    pub fn flush(&self) -> Result<FlushOutcome> {
        if self.held_by_current_thread() {
            return Ok(FlushOutcome::Reentrant);
        }

        let mut state = self.lock();
        if state.settings.local_root().is_none() {
            return Ok(FlushOutcome::Disabled);
        }
        if state.buffer.is_empty() {
            return Ok(FlushOutcome::Buffered);
        }

        let now = self.clock.now();
        let outcome = self.write_buffer(&mut state, now);
        if outcome.is_err() {
            self.enforce_hard_cap(&mut state);
        }
        outcome
    }

    /// Replace the local logging settings. Buffered lines are kept.
    pub fn configure(&self, settings: LocalLogSettings) {
        let mut state = self.lock();
        debug!(
            local_log = settings.local_log,
            has_directory = settings.log_directory.is_some(),
            "Applied local log settings"
        );
        state.settings = settings;
    }

    pub fn settings(&self) -> LocalLogSettings {
        self.lock().settings.clone()
    }

    pub fn buffered(&self) -> String {
        self.lock().buffer.clone()
    }

    pub fn buffered_len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn last_flush(&self) -> DateTime<Utc> {
        self.lock().last_flush
    }

    pub fn stats(&self) -> FlushStats {
        FlushStats {
            flushes: self.counters.flushes.load(Ordering::Relaxed),
            failed_flushes: self.counters.failed_flushes.load(Ordering::Relaxed),
            bytes_written: self.counters.bytes_written.load(Ordering::Relaxed),
            bytes_evicted: self.counters.bytes_evicted.load(Ordering::Relaxed),
        }
    }

    fn write_buffer(&self, state: &mut FlushState, now: DateTime<Utc>) -> Result<FlushOutcome> {
        let Some(root) = state.settings.local_root() else {
            return Ok(FlushOutcome::Disabled);
        };
        let dir = root.join(&state.settings.app_identifier);
        let path = dir.join(bucket_file_name(now));

        let written = self
            .storage
            .create_dir_all(&dir)
            .map_err(|source| LogTreeError::Flush {
                path: dir.clone(),
                source,
            })
            .and_then(|_| {
                self.storage
                    .append_file(&path, state.buffer.as_bytes())
                    .map_err(|source| LogTreeError::Flush {
                        path: path.clone(),
                        source,
                    })
            });

        if let Err(err) = written {
            self.counters.failed_flushes.fetch_add(1, Ordering::Relaxed);
            warn!(error = %err, buffered = state.buffer.len(), "Local log flush failed");
            return Err(err);
        }

        let bytes = state.buffer.len();
        state.clear();
        state.last_flush = self.clock.now();

        self.counters.flushes.fetch_add(1, Ordering::Relaxed);
        self.counters
            .bytes_written
            .fetch_add(bytes as u64, Ordering::Relaxed);
        debug!(path = ?path, bytes, "Flushed local log buffer");

        Ok(FlushOutcome::Flushed { path, bytes })
    }

    fn enforce_hard_cap(&self, state: &mut FlushState) {
        let Some(cap) = state.settings.hard_cap_bytes else {
            return;
        };

        let before = state.buffer.len();
        while state.buffer.len() > cap {
            match state.entries.pop_front() {
                Some(len) => {
                    state.buffer.drain(..len);
                }
                None => state.buffer.clear(),
            }
        }

        let evicted = before - state.buffer.len();
        if evicted > 0 {
            self.counters
                .bytes_evicted
                .fetch_add(evicted as u64, Ordering::Relaxed);
            warn!(evicted, cap, "Evicted oldest buffered log lines");
        }
    }
}

impl std::fmt::Debug for FlushEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlushEngine")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// File name of the hour bucket containing `now`, in local time.
///
/// e.g. `2024-03-05(02PM)_opacity_sdk_log.txt`
pub fn bucket_file_name(now: DateTime<Utc>) -> String {
    format!(
        "{}{}",
        now.with_timezone(&Local).format(BUCKET_FORMAT),
        LOG_FILE_SUFFIX
    )
}

/// Buffered form of a line: `[hh:mm:ss.SSS] <line>\n`, local 12-hour clock.
pub fn format_line(now: DateTime<Utc>, line: &str) -> String {
    format!(
        "[{}] {}\n",
        now.with_timezone(&Local).format(LINE_TIME_FORMAT),
        line
    )
}
