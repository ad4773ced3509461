//! Local completion fallback
//!
//! When the host cannot take a completion, the would-be payload is surfaced
//! to the user instead so the action is still observably done.

use std::io::{self, BufRead, Write};

use colored::Colorize;
use serde_json::Value;
use tracing::debug;

use crate::store::Snapshot;

pub trait CompletionFallback: Send + Sync {
    fn show(&self, outcome: &str, data: &Snapshot);
}

/// Prints the payload; in interactive mode blocks until Enter is pressed
#[derive(Debug, Clone, Default)]
pub struct ConsoleFallback {
    interactive: bool,
}

impl ConsoleFallback {
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }
}

/// Text shown by the console fallback
pub fn describe_completion(outcome: &str, data: &Snapshot) -> String {
    let payload = serde_json::to_string_pretty(&Value::Object(data.clone()))
        .unwrap_or_else(|_| "{}".to_string());
    format!("Task completed with outcome '{}'\nData: {}", outcome, payload)
}

impl CompletionFallback for ConsoleFallback {
    fn show(&self, outcome: &str, data: &Snapshot) {
        println!("{} {}", "✓".green(), describe_completion(outcome, data));
        if self.interactive {
            wait_for_confirmation(&mut io::stdin().lock(), &mut io::stdout());
        }
    }
}

/// Prompt on `output` and block until a line arrives on `input`.
/// Returns `false` if the prompt or the read failed.
fn wait_for_confirmation(input: &mut impl BufRead, output: &mut impl Write) -> bool {
    let prompted = write!(output, "{}", "Press Enter to confirm...".dimmed())
        .and_then(|_| output.flush());
    if let Err(e) = &prompted {
        debug!(error = %e, "Failed to show confirmation prompt");
    }
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(_) => prompted.is_ok(),
        Err(e) => {
            debug!(error = %e, "Failed to read confirmation");
            false
        }
    }
}
