//! Async line input for the chat REPL.
//!
//! Wraps `rustyline_async::Readline` and classifies each line into a
//! [`ReplEvent`], so the loop only deals with intent.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// What the user asked for with one line of input.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplEvent {
    /// Text for the assistant (a chat line or a `.` command).
    Line(String),
    /// `/help`.
    Help,
    /// `/clear`.
    Clear,
    /// `/quit`, `/exit`, or Ctrl+D.
    Quit,
    /// Ctrl+C or an empty line; the loop keeps going.
    Nothing,
}

/// Classify one submitted line.
pub fn classify(line: &str) -> ReplEvent {
    let line = line.trim();
    match line {
        "" => ReplEvent::Nothing,
        "/help" | "/?" => ReplEvent::Help,
        "/clear" => ReplEvent::Clear,
        "/quit" | "/exit" | "/q" => ReplEvent::Quit,
        _ => ReplEvent::Line(line.to_string()),
    }
}

pub struct ReplInput {
    rl: Readline,
}

impl ReplInput {
    /// Returns the input handle and a writer that prints above the prompt.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, writer) = Readline::new(prompt)?;
        Ok((Self { rl }, writer))
    }

    pub async fn next_event(&mut self) -> ReplEvent {
        match self.rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => classify(&line),
            Ok(ReadlineEvent::Interrupted) => ReplEvent::Nothing,
            Ok(ReadlineEvent::Eof) | Err(_) => ReplEvent::Quit,
        }
    }

    pub fn clear(&mut self) {
        let _ = self.rl.clear();
    }
}
