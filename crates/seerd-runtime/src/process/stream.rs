//! Async stream line readers (non-UTF8-safe).
//!
//! Supervised programs can emit non-UTF8 bytes on stdout/stderr. Using
//! `BufReader::lines()` would terminate the reader task on invalid UTF-8, so
//! lines are read as bytes and decoded lossily.

use seerd_core::OutputStream;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use super::logs::RunLog;

/// Forward every line of `stream` to the run log until EOF.
pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    name: String,
    source: OutputStream,
    log: RunLog,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    // Trim trailing newline(s)
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let line = String::from_utf8_lossy(&buf).into_owned();
                    debug!(name = %name, stream = source.tag(), "{}", line);
                    log.append(source, line);
                }
                Err(e) => {
                    debug!(name = %name, stream = source.tag(), error = %e, "output reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(name = %name, stream = source.tag(), "output reader task exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::logs::tail_log;
    use chrono::Local;

    #[tokio::test]
    async fn test_reader_handles_invalid_utf8_and_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::create(dir.path(), "svc", Local::now()).await.unwrap();
        let path = log.path().to_path_buf();

        let input: &[u8] = b"first\r\nbad \xff byte\nno newline";
        spawn_stream_reader(input, "svc".to_string(), OutputStream::Stdout, log)
            .await
            .unwrap();

        let mut lines = Vec::new();
        for _ in 0..50 {
            lines = tail_log(&path, 10).await.unwrap();
            if lines.len() == 3 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("] first"));
        assert!(lines[1].contains("bad \u{fffd} byte"));
        assert!(lines[2].ends_with("] no newline"));
    }
}
