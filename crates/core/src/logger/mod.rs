//! Timestamped, color-tagged logging to the console and an append-only file.
//!
//! Every line looks like `[14:03:07.42] - Hopper > Published ...`: a UTC
//! timestamp with hundredths of a second, then the text. The console copy
//! is colored; the file copy is plain. A failed file write is reported on
//! the console and otherwise ignored, so logging can never fail a stage.

use chrono::{DateTime, Timelike, Utc};
use colored::{Color, Colorize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Default log file name inside the log directory.
pub const DEFAULT_LOG_FILE: &str = "log.txt";

/// Cloneable handle to the shared log sinks.
///
/// All clones write through one lock so lines from concurrent stages never
/// interleave, and the console and file copies stay in the same order.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Mutex<Sinks>>,
}

struct Sinks {
    console: bool,
    file: Option<PathBuf>,
}

impl Logger {
    /// Log to the console and append to `file`.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self::with_sinks(true, Some(file.into()))
    }

    /// Drop every line. Useful for tests that only look at events.
    pub fn disabled() -> Self {
        Self::with_sinks(false, None)
    }

    /// Append to `file` without echoing to the console.
    pub fn file_only(file: impl Into<PathBuf>) -> Self {
        Self::with_sinks(false, Some(file.into()))
    }

    fn with_sinks(console: bool, file: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Sinks { console, file })),
        }
    }

    /// Path of the file sink, if any.
    pub fn file_path(&self) -> Option<PathBuf> {
        let sinks = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        sinks.file.clone()
    }

    /// Write `text` in `color`.
    pub fn log(&self, text: impl AsRef<str>, color: Color) {
        let line = format_line(Utc::now(), text.as_ref());

        // A panic while holding the lock only ever interrupts a write, the
        // sink configuration itself is still valid.
        let sinks = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if sinks.console {
            println!("{}", line.as_str().color(color));
        }

        if let Some(path) = &sinks.file {
            if let Err(e) = append_line(path, &line) {
                if sinks.console {
                    println!("Error writing to log file: {e}");
                }
            }
        }
    }

    pub fn info(&self, text: impl AsRef<str>) {
        self.log(format!("INFO: {}", text.as_ref()), Color::Green);
    }

    pub fn warning(&self, text: impl AsRef<str>) {
        self.log(format!("WARNING: {}", text.as_ref()), Color::Yellow);
    }

    pub fn error(&self, text: impl AsRef<str>) {
        self.log(format!("ERROR: {}", text.as_ref()), Color::Red);
    }

    /// Log an error followed by a second line with the full detail.
    pub fn error_with_detail(&self, text: impl AsRef<str>, detail: &dyn std::fmt::Debug) {
        self.error(text);
        self.log(format!("Exception Details: {detail:?}"), Color::Red);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("file", &self.file_path())
            .finish()
    }
}

/// Parse a color name from configuration, falling back to white.
pub fn parse_color(name: &str) -> Color {
    name.parse().unwrap_or(Color::White)
}

/// Create the log directory (and parents) if it does not exist yet.
pub fn ensure_log_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// `[HH:MM:SS.ff] - text`
fn format_line(at: DateTime<Utc>, text: &str) -> String {
    let hundredths = at.nanosecond() % 1_000_000_000 / 10_000_000;
    format!("[{}.{hundredths:02}] - {text}", at.format("%H:%M:%S"))
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_line_uses_24h_clock_and_hundredths() {
        let at = Utc
            .with_ymd_and_hms(2024, 10, 30, 17, 4, 9)
            .unwrap()
            .with_nanosecond(457_000_000)
            .unwrap();

        assert_eq!(format_line(at, "hello"), "[17:04:09.45] - hello");
    }

    #[test]
    fn test_logger_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let logger = Logger::file_only(&path);

        logger.log("first", Color::Cyan);
        logger.info("second");
        logger.error_with_detail("third", &"boom");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("] - first"));
        assert!(lines[1].ends_with("] - INFO: second"));
        assert!(lines[2].ends_with("] - ERROR: third"));
        assert!(lines[3].contains("Exception Details: \"boom\""));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_logger_swallows_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let logger = Logger::file_only(dir.path());

        logger.warning("still fine");
        assert_eq!(logger.file_path().as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_clones_share_the_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.txt");
        let logger = Logger::file_only(&path);
        let clone = logger.clone();

        logger.log("a", Color::White);
        clone.log("b", Color::White);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_parse_color_falls_back_to_white() {
        assert_eq!(parse_color("magenta"), Color::Magenta);
        assert_eq!(parse_color("not-a-color"), Color::White);
    }

    #[test]
    fn test_ensure_log_dir_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs").join("run");

        ensure_log_dir(&nested).unwrap();
        ensure_log_dir(&nested).unwrap();

        assert!(nested.is_dir());
    }
}
