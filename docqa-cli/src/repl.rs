//! Interactive question loop.

use std::path::PathBuf;

use anyhow::Result;
use docqa_rag::IngestConfig;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::error;

use crate::render;
use crate::session::{AskOutcome, Session};

const HELP: &str = "Type a question, or one of:
  :ingest <FILES>...  index more files
  :clear              remove every indexed chunk
  :help               show this message
  :quit               leave";

/// One line of input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    Ingest(Vec<PathBuf>),
    Clear,
    Help,
    Quit,
    Empty,
    /// A `:`-command that is not recognized, or used wrongly.
    Invalid(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(command) = line.strip_prefix(':') else {
            return Self::Ask(line.to_string());
        };

        let mut words = command.split_whitespace();
        match words.next().unwrap_or_default() {
            "quit" | "q" | "exit" => Self::Quit,
            "clear" => Self::Clear,
            "help" | "h" => Self::Help,
            "ingest" => {
                let paths: Vec<PathBuf> = words.map(PathBuf::from).collect();
                if paths.is_empty() {
                    Self::Invalid("usage: :ingest <FILES>...".to_string())
                } else {
                    Self::Ingest(paths)
                }
            }
            other => Self::Invalid(format!("unknown command ':{other}' (try :help)")),
        }
    }
}

/// Run the loop until `:quit`, Ctrl-D or Ctrl-C.
///
/// Errors from a single question or ingest are printed and the loop continues.
pub async fn run(session: &Session, k: usize, ingest: &IngestConfig) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("docqa chat on '{}'. {HELP}", session.collection().name());

    loop {
        let line = match editor.readline("docqa> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        let outcome = match ReplCommand::parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Help => {
                println!("{HELP}");
                continue;
            }
            ReplCommand::Invalid(message) => {
                eprintln!("{message}");
                continue;
            }
            ReplCommand::Clear => session.clear().await.map(|()| {
                format!("Cleared collection '{}'", session.collection().name())
            }),
            ReplCommand::Ingest(paths) => session
                .ingest(&paths, ingest)
                .await
                .map(|report| render::ingest_summary(&report, session.collection().name())),
            ReplCommand::Ask(question) => {
                session.ask(&question, k).await.map(|outcome| match outcome {
                    AskOutcome::NothingIndexed => render::NOTHING_INDEXED.to_string(),
                    AskOutcome::Answered(answer) => render::answer(&answer),
                })
            }
        };

        match outcome {
            Ok(text) => println!("{text}\n"),
            Err(e) => {
                error!(error = %e, "command failed");
                eprintln!("Error: {e:#}\n");
            }
        }
    }

    Ok(())
}
