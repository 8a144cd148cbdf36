//! Lightweight performance instrumentation.
//!
//! Scopes time builder passes and session updates. With `--perf` each scope
//! reports to stderr and is folded into per-name totals; with a render debug
//! log it is also appended to that file.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{LazyLock, Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOGGER: LazyLock<Mutex<DebugLogger>> = LazyLock::new(|| Mutex::new(DebugLogger::new()));
static TOTALS: LazyLock<Mutex<BTreeMap<&'static str, ScopeStats>>> =
    LazyLock::new(|| Mutex::new(BTreeMap::new()));

/// Accumulated timings of one scope name.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScopeStats {
    pub calls: u32,
    pub total_ms: f64,
}

impl ScopeStats {
    pub fn mean_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_ms / f64::from(self.calls)
        }
    }
}

/// Timing guard; reports on drop to stderr and/or the debug log.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        let to_stderr = is_enabled();
        let to_log = DEBUG_ENABLED.load(Ordering::Relaxed);
        if !to_stderr && !to_log {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        if to_stderr {
            eprintln!("[perf] {}: {:.2} ms", self.name, elapsed_ms);
            record(self.name, elapsed_ms);
        }
        if to_log {
            log_event(self.name, format!("{elapsed_ms:.2} ms"));
        }
    }
}

#[derive(Debug)]
struct DebugLogger {
    enabled: bool,
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl DebugLogger {
    fn new() -> Self {
        Self {
            enabled: false,
            start: Instant::now(),
            writer: None,
        }
    }
}

fn logger() -> MutexGuard<'static, DebugLogger> {
    match DEBUG_LOGGER.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn totals() -> MutexGuard<'static, BTreeMap<&'static str, ScopeStats>> {
    match TOTALS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn record(name: &'static str, elapsed_ms: f64) {
    let mut totals = totals();
    let stats = totals.entry(name).or_default();
    stats.calls += 1;
    stats.total_ms += elapsed_ms;
}

/// Per-scope totals for the process, sorted by name.
pub fn summary() -> Vec<(&'static str, ScopeStats)> {
    totals().iter().map(|(name, stats)| (*name, *stats)).collect()
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut logger = logger();
    if let Some(path) = path {
        let file = File::create(path)?;
        logger.enabled = true;
        DEBUG_ENABLED.store(true, Ordering::Relaxed);
        logger.start = Instant::now();
        logger.writer = Some(BufWriter::new(file));
        if let Some(writer) = logger.writer.as_mut() {
            writeln!(writer, "livemark render debug log start")?;
            writer.flush()?;
        }
    } else {
        logger.enabled = false;
        DEBUG_ENABLED.store(false, Ordering::Relaxed);
        logger.writer = None;
    }
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    logger().enabled
}

pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let mut logger = logger();
    if !logger.enabled {
        return;
    }
    let elapsed_ms = logger.start.elapsed().as_secs_f64() * 1000.0;
    if let Some(writer) = logger.writer.as_mut() {
        let _ = writeln!(
            writer,
            "[{elapsed_ms:>10.3} ms] {name}: {}",
            detail.as_ref()
        );
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_set_enabled_toggles_runtime_flag() {
        set_enabled(true);
        assert!(is_enabled());

        set_enabled(false);
        assert!(!is_enabled());
    }

    #[test]
    fn test_debug_log_path_enables_logging_and_writes() {
        let temp_file = NamedTempFile::new().unwrap();
        set_debug_log_path(Some(temp_file.path())).unwrap();
        assert!(is_debug_log_enabled());
        log_event("test.event", "hello world");
        drop(scope("test.scope"));
        set_debug_log_path(None).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("livemark render debug log start"));
        assert!(content.contains("test.event: hello world"));
        assert!(content.contains("test.scope: "));
    }

    #[test]
    fn test_record_accumulates_per_name() {
        record("test.summary.a", 2.0);
        record("test.summary.a", 4.0);
        record("test.summary.b", 1.0);
        let summary = summary();
        let a = summary
            .iter()
            .find(|(name, _)| *name == "test.summary.a")
            .map(|(_, stats)| *stats)
            .unwrap();
        assert_eq!(a.calls, 2);
        assert!((a.mean_ms() - 3.0).abs() < f64::EPSILON);
        assert!(summary.iter().any(|(name, _)| *name == "test.summary.b"));
    }

    #[test]
    fn test_mean_of_empty_stats_is_zero() {
        assert!(ScopeStats::default().mean_ms().abs() < f64::EPSILON);
    }
}
