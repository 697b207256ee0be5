//! Browser process launching.
//!
//! Builds the argument vector with POSIX shell-word-splitting rules, spawns
//! the browser binary, and waits for it to exit with both output streams
//! captured. The wait is unbounded: the message loop processes nothing else
//! until the child terminates.

use crate::protocol::ResultEnvelope;
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;

/// Result of one launch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Child exited with status zero
    Launched,

    /// Child exited nonzero; both captured streams, trailing whitespace
    /// trimmed
    Failed {
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// The child could not be spawned at all (missing executable, permission
    /// denied, unparsable command line)
    SpawnFailed(String),
}

impl LaunchOutcome {
    /// Map this outcome to the Result Envelopes owed to the caller.
    ///
    /// Success and spawn failure each produce one envelope; a nonzero exit
    /// produces two (stdout error first, then stderr error), both sent even
    /// when empty.
    pub fn into_envelopes(self) -> Vec<ResultEnvelope> {
        match self {
            Self::Launched => vec![ResultEnvelope::Result("dartium launched".to_string())],
            Self::Failed { stdout, stderr } => {
                vec![ResultEnvelope::Error(stdout), ResultEnvelope::Error(stderr)]
            }
            Self::SpawnFailed(reason) => vec![ResultEnvelope::Error(reason)],
        }
    }
}

impl fmt::Display for LaunchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launched => write!(f, "launched"),
            Self::Failed { .. } => write!(f, "exited with failure"),
            Self::SpawnFailed(reason) => write!(f, "spawn failed: {}", reason),
        }
    }
}

/// Extension point for different launch strategies.
///
/// Production uses [`ProcessLauncher`]; tests substitute a recording fake.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Launch `path` with `url` as its argument and wait for it to exit.
    async fn launch(&self, path: &str, url: &str) -> LaunchOutcome;
}

/// Launcher backed by a real child process.
pub struct ProcessLauncher;

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, path: &str, url: &str) -> LaunchOutcome {
        // The two strings are joined with a space and tokenized as a shell
        // would, so quoting inside either of them is shell syntax. A path
        // with unquoted spaces therefore splits into several words.
        let command_line = format!("{} {}", path, url);
        let argv = match shell_words::split(&command_line) {
            Ok(argv) => argv,
            Err(e) => return LaunchOutcome::SpawnFailed(e.to_string()),
        };

        let Some((program, args)) = argv.split_first() else {
            return LaunchOutcome::SpawnFailed("empty command line".to_string());
        };

        tracing::debug!(program = %program, args = ?args, "spawning browser process");

        let output = match Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => return LaunchOutcome::SpawnFailed(e.to_string()),
        };

        if output.status.success() {
            LaunchOutcome::Launched
        } else {
            LaunchOutcome::Failed {
                stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            }
        }
    }
}
