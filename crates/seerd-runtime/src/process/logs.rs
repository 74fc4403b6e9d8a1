//! Per-run process log files.
//!
//! Each launch opens one append-only file named after the process and the
//! run start time (`<name>_<YYYYmmdd_HHMMSS>.log`). Lines are prefixed with
//! their source and a wall-clock timestamp:
//!
//! ```text
//! [SYS][14:02:10] Process started (pid 4242)
//! [OUT][14:02:11] listening on :8080
//! [ERR][14:02:12] warning: cache miss
//! ```
//!
//! Writes go through a channel to a single writer task that owns the file,
//! so the stdout and stderr readers never contend on it. The file is closed
//! when the last [`RunLog`] handle is dropped.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use seerd_core::OutputStream;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Default number of lines returned by [`tail_log`] callers.
pub const DEFAULT_TAIL_LINES: usize = 20;

#[derive(Debug)]
struct LogLine {
    stream: OutputStream,
    at: DateTime<Local>,
    text: String,
}

impl LogLine {
    fn render(&self) -> String {
        format!(
            "[{}][{}] {}\n",
            self.stream.tag(),
            self.at.format("%H:%M:%S"),
            self.text
        )
    }
}

/// Handle to the log file of one run. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RunLog {
    tx: mpsc::UnboundedSender<LogLine>,
    path: PathBuf,
}

impl RunLog {
    /// Create `dir` if needed and open a fresh log file for `name`.
    pub async fn create(dir: &Path, name: &str, started: DateTime<Local>) -> io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(log_file_name(name, started));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_lines(file, rx, path.clone()));

        debug!(name = %name, path = %path.display(), "Opened run log");
        Ok(Self { tx, path })
    }

    /// Queue a line stamped with the current time.
    pub fn append(&self, stream: OutputStream, text: impl Into<String>) {
        let line = LogLine {
            stream,
            at: Local::now(),
            text: text.into(),
        };
        // The writer only goes away after a write error, which it already logged
        let _ = self.tx.send(line);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn write_lines(
    mut file: tokio::fs::File,
    mut rx: mpsc::UnboundedReceiver<LogLine>,
    path: PathBuf,
) {
    while let Some(line) = rx.recv().await {
        let result = async {
            file.write_all(line.render().as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Run log write failed, closing log");
            break;
        }
    }
    debug!(path = %path.display(), "Run log writer exiting");
}

/// File name for a run of `name` started at `started`.
///
/// Characters that are not safe in file names are replaced with `_`.
pub fn log_file_name(name: &str, started: DateTime<Local>) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{safe}_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Last `n` lines of a log file (lossy UTF-8).
pub async fn tail_log(path: &Path, n: usize) -> io::Result<Vec<String>> {
    let bytes = tokio::fs::read(path).await?;
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].iter().map(|l| (*l).to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_log_file_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(log_file_name("api", at), "api_20240309_070501.log");
        assert_eq!(log_file_name("a/b c", at), "a_b_c_20240309_070501.log");
    }

    #[tokio::test]
    async fn test_lines_are_prefixed_and_flushed() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::create(dir.path(), "svc", Local::now()).await.unwrap();

        log.append(OutputStream::Stdout, "hello");
        log.append(OutputStream::Stderr, "oops");
        log.append(OutputStream::System, "bye");

        let path = log.path().to_path_buf();
        drop(log);

        let mut lines = Vec::new();
        for _ in 0..50 {
            lines = tail_log(&path, 10).await.unwrap();
            if lines.len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[OUT]["));
        assert!(lines[0].ends_with("] hello"));
        assert!(lines[1].starts_with("[ERR]["));
        assert!(lines[2].starts_with("[SYS]["));
    }

    #[tokio::test]
    async fn test_tail_returns_last_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.log");
        tokio::fs::write(&path, "1\n2\n3\n4\n").await.unwrap();

        assert_eq!(tail_log(&path, 2).await.unwrap(), vec!["3", "4"]);
        assert_eq!(tail_log(&path, 10).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_create_makes_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let log = RunLog::create(&nested, "svc", Local::now()).await.unwrap();
        assert!(log.path().starts_with(&nested));
        assert!(nested.is_dir());
    }
}
