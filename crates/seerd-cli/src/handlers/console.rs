//! Console command handler: the interactive shell.
//!
//! Lines are split with shell quoting rules, so multi-word arguments can be
//! quoted:
//!
//! ```text
//! > start api /opt/api/bin/api "--port 8080 --verbose" /opt/api
//! > send api reload config
//! > logs api 50
//! ```
//!
//! Status transitions are printed from a subscription task as they happen.

use anyhow::Result;
use seerd_core::{ProcessSpec, ProcessSupervisor};
use seerd_runtime::DEFAULT_TAIL_LINES;

use super::{info, list, logs};
use crate::bootstrap::CliContext;
use crate::utils::line_reader::{Input, LineReader};

const HELP: &str = "\
Available commands:
  start <name> <path> [args] [workdir] - Start monitoring a process
  stop <name>                          - Stop monitoring a process
  restart <name>                       - Restart a monitored process
  send <name> <text...>                - Write a line to a process's stdin
  list                                 - List all monitored processes
  info <name>                          - Show detailed process info
  logs <name> [lines]                  - Show the tail of a process's log
  help                                 - Show this help
  exit                                 - Stop everything and exit";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start {
        name: String,
        path: String,
        arguments: String,
        working_directory: Option<String>,
    },
    Stop(String),
    Restart(String),
    Send { name: String, text: String },
    List,
    Info(String),
    Logs { name: String, lines: usize },
    Help,
    Exit,
    /// Blank line.
    Nothing,
}

/// Whether the shell keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Parse one input line. The error is a message to show the user.
pub fn parse_line(line: &str) -> Result<ConsoleCommand, String> {
    let parts = shell_words::split(line).map_err(|e| format!("Could not parse line: {e}"))?;
    let Some((verb, rest)) = parts.split_first() else {
        return Ok(ConsoleCommand::Nothing);
    };

    let command = match (verb.to_lowercase().as_str(), rest) {
        ("start", [name, path, tail @ ..]) if tail.len() <= 2 => ConsoleCommand::Start {
            name: name.clone(),
            path: path.clone(),
            arguments: tail.first().cloned().unwrap_or_default(),
            working_directory: tail.get(1).cloned(),
        },
        ("start", _) => return Err("Usage: start <name> <path> [args] [workdir]".to_string()),
        ("stop", [name]) => ConsoleCommand::Stop(name.clone()),
        ("stop", _) => return Err("Usage: stop <name>".to_string()),
        ("restart", [name]) => ConsoleCommand::Restart(name.clone()),
        ("restart", _) => return Err("Usage: restart <name>".to_string()),
        ("send", [name, text @ ..]) if !text.is_empty() => ConsoleCommand::Send {
            name: name.clone(),
            text: text.join(" "),
        },
        ("send", _) => return Err("Usage: send <name> <text...>".to_string()),
        ("list", _) => ConsoleCommand::List,
        ("info", [name]) => ConsoleCommand::Info(name.clone()),
        ("info", _) => return Err("Usage: info <name>".to_string()),
        ("logs", [name]) => ConsoleCommand::Logs {
            name: name.clone(),
            lines: DEFAULT_TAIL_LINES,
        },
        ("logs", [name, n]) => ConsoleCommand::Logs {
            name: name.clone(),
            lines: n
                .parse()
                .map_err(|_| format!("Invalid line count: {n}"))?,
        },
        ("logs", _) => return Err("Usage: logs <name> [lines]".to_string()),
        ("help", _) => ConsoleCommand::Help,
        ("exit" | "quit", _) => ConsoleCommand::Exit,
        _ => return Err("Unknown command. Type 'help' for available commands.".to_string()),
    };
    Ok(command)
}

/// Executes parsed commands against the engine.
pub struct Console<'a> {
    supervisor: &'a dyn ProcessSupervisor,
    /// Auto-restart policy for processes started from the prompt.
    auto_restart: bool,
}

impl<'a> Console<'a> {
    pub fn new(supervisor: &'a dyn ProcessSupervisor, auto_restart: bool) -> Self {
        Self {
            supervisor,
            auto_restart,
        }
    }

    /// Run one command. Engine errors are returned for the caller to print.
    pub async fn dispatch(&self, command: ConsoleCommand) -> Result<Flow> {
        match command {
            ConsoleCommand::Start {
                name,
                path,
                arguments,
                working_directory,
            } => {
                let mut spec = ProcessSpec::new(name.clone(), path)
                    .with_arguments(arguments)
                    .with_auto_restart(self.auto_restart);
                if let Some(dir) = working_directory {
                    spec = spec.with_working_directory(dir);
                }
                self.supervisor.start_monitoring(spec).await?;
                println!("Started {name}");
            }
            ConsoleCommand::Stop(name) => {
                self.supervisor.stop_monitoring(&name).await;
            }
            ConsoleCommand::Restart(name) => {
                self.supervisor.restart(&name).await?;
            }
            ConsoleCommand::Send { name, text } => {
                self.supervisor.send_command(&name, &text).await;
            }
            ConsoleCommand::List => list::execute(self.supervisor),
            ConsoleCommand::Info(name) => info::execute(self.supervisor, &name),
            ConsoleCommand::Logs { name, lines } => {
                logs::execute(self.supervisor, &name, lines).await?;
            }
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Exit => return Ok(Flow::Exit),
            ConsoleCommand::Nothing => {}
        }
        Ok(Flow::Continue)
    }
}

/// Execute the console command.
pub async fn execute(ctx: &CliContext, autostart: bool) -> Result<()> {
    println!("seerd console");
    println!("{HELP}");
    println!();

    let printer = ctx.registry().on_status_changed(|record| {
        println!("Process {} status changed to {}", record.name, record.state);
    });

    if autostart {
        let failures = ctx.registry().start_all(ctx.apps.specs()).await;
        for (name, e) in failures {
            println!("Error: {name}: {e}");
        }
    }

    let console = Console::new(
        ctx.supervisor(),
        ctx.apps.supervisor.effective_auto_restart(),
    );
    let result = read_commands(&console).await;

    ctx.registry().shutdown().await;
    printer.abort();
    result
}

async fn read_commands(console: &Console<'_>) -> Result<()> {
    let mut reader = LineReader::spawn("> ")?;
    loop {
        let line = match reader.next().await? {
            Input::Line(line) => line,
            Input::Closed => return Ok(()),
        };

        match parse_line(&line) {
            Ok(command) => match console.dispatch(command).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Err(e) => println!("Error: {e}"),
            },
            Err(message) => println!("{message}"),
        }
    }
}
