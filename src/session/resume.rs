//! Resume/no-resume decision point
//!
//! An interrupted crawl leaves a checkpoint behind; whether to pick it
//! up is an operator decision. Interactive deployments get a prompt,
//! unattended ones select a fixed policy so nothing blocks on stdin.

use crate::session::checkpoint::CheckpointEnvelope;
use std::io::{self, BufRead, Write};

/// How the resume decision is made when a checkpoint exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumePolicy {
    /// Resume without asking
    Always,

    /// Discard the checkpoint and start fresh without asking
    Never,

    /// Show the checkpoint summary and ask on stdin
    #[default]
    Interactive,
}

impl ResumePolicy {
    /// Decides whether to resume from the given checkpoint.
    ///
    /// Declining means the caller clears the checkpoint and starts
    /// fresh.
    pub fn decide(&self, envelope: &CheckpointEnvelope) -> bool {
        match self {
            Self::Always => {
                tracing::info!(
                    "Resuming session {} ({})",
                    envelope.session_name,
                    envelope.data.summary()
                );
                true
            }
            Self::Never => {
                tracing::info!(
                    "Ignoring checkpoint for session {} (policy: never resume)",
                    envelope.session_name
                );
                false
            }
            Self::Interactive => prompt(envelope),
        }
    }
}

/// Prompts on stdout/stdin; any answer other than "n"/"no" resumes
fn prompt(envelope: &CheckpointEnvelope) -> bool {
    println!(
        "Found checkpoint for session '{}' from {}:",
        envelope.session_name,
        envelope.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  {}", envelope.data.summary());
    print!("Resume? [Y/n] ");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        // No usable stdin: safest default is to resume rather than
        // discard progress
        return true;
    }
    !matches!(answer.trim().to_lowercase().as_str(), "n" | "no")
}
