//! Rolling File Logger
//!
//! Writes formatted log lines to one file per day under a log directory,
//! keeps only the newest few files, and remembers the most recent lines in
//! a circular buffer so an app can show them without touching the disk.
//!
//! Records emitted through the `log` facade are bridged into the same sink.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::MakeWriter;

/// Number of daily log files kept on disk
pub const MAX_LOG_FILES: usize = 7;

/// Number of recent lines kept in memory
pub const RECENT_CAPACITY: usize = 500;

static LOGGER: OnceLock<RollingFile> = OnceLock::new();

struct Inner {
    dir: PathBuf,
    prefix: String,
    current_date: String,
    file: Option<File>,
    recent: VecDeque<String>,
    capacity: usize,
}

impl Inner {
    fn rotate_if_needed(&mut self) -> io::Result<()> {
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        if self.file.is_some() && self.current_date == today {
            return Ok(());
        }

        let path = self.dir.join(format!("{}.{}.log", self.prefix, today));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.file = Some(file);
        self.current_date = today;
        prune_old_files(&self.dir, &self.prefix, MAX_LOG_FILES)
    }

    fn remember(&mut self, buf: &[u8]) {
        for line in String::from_utf8_lossy(buf).lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if self.recent.len() == self.capacity {
                self.recent.pop_front();
            }
            self.recent.push_back(line.to_string());
        }
    }
}

/// Shared handle to the rolling sink; cheap to clone.
#[derive(Clone)]
pub struct RollingFile {
    inner: Arc<Mutex<Inner>>,
}

impl RollingFile {
    /// Create the sink, creating `dir` if it does not exist yet
    pub fn new(dir: impl Into<PathBuf>, prefix: &str, capacity: usize) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                dir,
                prefix: prefix.to_string(),
                current_date: String::new(),
                file: None,
                recent: VecDeque::with_capacity(capacity),
                capacity: capacity.max(1),
            })),
        })
    }

    /// Most recent lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        match self.inner.lock() {
            Ok(inner) => inner.recent.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "logger lock poisoned"))?;
        inner.rotate_if_needed()?;
        inner.remember(buf);
        if let Some(file) = inner.file.as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "logger lock poisoned"))?;
        match inner.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RollingFile {
    type Writer = RollingFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Delete the oldest `<prefix>.*.log` files so at most `keep` remain
fn prune_old_files(dir: &Path, prefix: &str, keep: usize) -> io::Result<()> {
    let marker = format!("{}.", prefix);
    let mut logs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(&marker) && n.ends_with(".log"))
                .unwrap_or(false)
        })
        .collect();

    if logs.len() <= keep {
        return Ok(());
    }

    // Dated names sort chronologically
    logs.sort();
    let excess = logs.len() - keep;
    for path in logs.into_iter().take(excess) {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Initialize the global logger at INFO level
pub fn init_logger(log_dir: impl Into<PathBuf>, app_name: &str) -> Result<(), String> {
    init_logger_with_level(log_dir, app_name, log::LevelFilter::Info)
}

/// Initialize the global logger with an explicit level.
///
/// Fails if a global subscriber is already installed.
pub fn init_logger_with_level(
    log_dir: impl Into<PathBuf>,
    app_name: &str,
    level: log::LevelFilter,
) -> Result<(), String> {
    let sink = RollingFile::new(log_dir, app_name, RECENT_CAPACITY)
        .map_err(|e| format!("Failed to open log dir: {}", e))?;

    tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .with_ansi(false)
        .with_max_level(to_tracing_level(level))
        .try_init()
        .map_err(|e| format!("Failed to install logger: {}", e))?;

    LOGGER
        .set(sink)
        .map_err(|_| "Logger already initialized".to_string())
}

fn to_tracing_level(level: log::LevelFilter) -> tracing_subscriber::filter::LevelFilter {
    use tracing_subscriber::filter::LevelFilter;
    match level {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    }
}

pub fn info(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::info!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::error!("{}", msg);
    Ok(())
}

/// Recent lines from the global logger (empty before init)
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(RollingFile::recent_lines).unwrap_or_default()
}

fn ensure_initialized() -> Result<(), String> {
    if LOGGER.get().is_some() {
        Ok(())
    } else {
        Err("Logger not initialized".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_dated_file_and_remembers_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = RollingFile::new(dir.path(), "app", 10).unwrap();

        sink.write_all(b"first line\nsecond line\n").unwrap();
        sink.flush().unwrap();

        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        let path = dir.path().join(format!("app.{}.log", today));
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("second line"));
        assert_eq!(sink.recent_lines(), vec!["first line", "second line"]);
    }

    #[test]
    fn test_recent_buffer_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = RollingFile::new(dir.path(), "app", 3).unwrap();

        for i in 0..5 {
            sink.write_all(format!("line {}\n", i).as_bytes()).unwrap();
        }

        assert_eq!(sink.recent_lines(), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_prune_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=5 {
            fs::write(dir.path().join(format!("app.2024-01-0{}.log", day)), "x").unwrap();
        }
        fs::write(dir.path().join("other.txt"), "keep").unwrap();

        prune_old_files(dir.path(), "app", 2).unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["app.2024-01-04.log", "app.2024-01-05.log", "other.txt"]);
    }

    #[test]
    fn test_helpers_fail_before_init() {
        // Tests in this module never install the global logger
        assert!(info("hello").is_err());
        assert!(recent_lines().is_empty());
    }
}
