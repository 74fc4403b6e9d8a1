//! Best-effort line delivery to a child's stdin.
//!
//! A writer task owns the `ChildStdin` and drains a bounded queue. Callers
//! enqueue with `try_send` and never wait on the pipe: a child that stops
//! reading only fills the queue, after which further lines are dropped.
//! Dropping the [`StdinWriter`] cancels the task even mid-write.

use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::command::LINE_ENDING;

/// Lines queued for a child that has not read them yet.
pub const STDIN_QUEUE_CAPACITY: usize = 64;

/// Why a line was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejected {
    /// The child is not draining its stdin fast enough.
    Full,
    /// The writer task has ended (pipe closed or cancelled).
    Closed,
}

/// Handle to the stdin writer task of one run.
#[derive(Debug)]
pub struct StdinWriter {
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
}

impl StdinWriter {
    pub fn spawn(stdin: ChildStdin, name: String) -> Self {
        let (tx, rx) = mpsc::channel(STDIN_QUEUE_CAPACITY);
        let cancel = CancellationToken::new();
        tokio::spawn(write_lines(stdin, rx, cancel.clone(), name));
        Self { tx, cancel }
    }

    /// Queue `text` plus a line terminator without waiting.
    pub fn try_send(&self, text: &str) -> Result<(), SendRejected> {
        self.tx
            .try_send(format!("{text}{LINE_ENDING}"))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => SendRejected::Full,
                mpsc::error::TrySendError::Closed(_) => SendRejected::Closed,
            })
    }
}

impl Drop for StdinWriter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn write_lines(
    mut stdin: ChildStdin,
    mut rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
    name: String,
) {
    loop {
        let line = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            line = rx.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        let written = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = async {
                stdin.write_all(line.as_bytes()).await?;
                stdin.flush().await
            } => result,
        };

        if let Err(e) = written {
            warn!(name = %name, error = %e, "Failed to write to process stdin");
            break;
        }
    }
    debug!(name = %name, "Stdin writer exiting");
}
