//! Interactive line input for the console.
//!
//! rustyline blocks the calling thread, so the editor lives on its own OS
//! thread. The async side asks for one line at a time; the thread only
//! shows the prompt when asked, so status messages printed between
//! commands do not land in the middle of a half-typed line.

use std::sync::mpsc as std_mpsc;
use std::thread;

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::debug;

/// One read attempt.
#[derive(Debug)]
pub enum Input {
    Line(String),
    /// Ctrl-C or Ctrl-D.
    Closed,
}

/// Handle to the editor thread.
pub struct LineReader {
    requests: std_mpsc::Sender<()>,
    lines: mpsc::UnboundedReceiver<Result<Input, String>>,
}

impl LineReader {
    /// Spawn the editor thread with a fixed prompt.
    pub fn spawn(prompt: &str) -> Result<Self> {
        let (requests, request_rx) = std_mpsc::channel::<()>();
        let (line_tx, lines) = mpsc::unbounded_channel();
        let prompt = prompt.to_string();

        thread::Builder::new()
            .name("seerd-console-input".to_string())
            .spawn(move || read_loop(&prompt, &request_rx, &line_tx))
            .context("Failed to spawn console input thread")?;

        Ok(Self { requests, lines })
    }

    /// Prompt for and wait on the next line.
    pub async fn next(&mut self) -> Result<Input> {
        if self.requests.send(()).is_err() {
            return Ok(Input::Closed);
        }
        match self.lines.recv().await {
            Some(Ok(input)) => Ok(input),
            Some(Err(e)) => Err(anyhow::anyhow!("Failed to read console input: {e}")),
            None => Ok(Input::Closed),
        }
    }
}

fn read_loop(
    prompt: &str,
    requests: &std_mpsc::Receiver<()>,
    lines: &mpsc::UnboundedSender<Result<Input, String>>,
) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            let _ = lines.send(Err(e.to_string()));
            return;
        }
    };

    // Ends when the LineReader is dropped
    while requests.recv().is_ok() {
        let input = match editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(Input::Closed),
            Err(e) => Err(e.to_string()),
        };
        if lines.send(input).is_err() {
            break;
        }
    }
    debug!("Console input thread exiting");
}
