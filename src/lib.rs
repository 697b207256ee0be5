//! Dartium Messaging Host
//!
//! Native messaging host that lets a Chrome extension launch a local
//! Dartium/Chromium browser pointed at a URL.
//!
//! # Architecture
//!
//! - Length-prefixed stdio framing per the browser native messaging protocol
//! - One recognized command (`"dartium"`), dispatched to a process launcher
//! - Zero, one, or two `result`/`error` envelopes back per inbound message
//!
//! The loop is strictly sequential: a launch blocks the channel until the
//! child exits, and the process ends only when the extension closes the
//! input stream.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dartium_messaging::HostConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = HostConfig::default();
//!     dartium_messaging::run_host(config).await
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod config;
mod dispatcher;
mod error;
mod launcher;
mod protocol;

// Re-export public API
pub use config::{HostConfig, BROWSER_FRAME_LIMIT};
pub use dispatcher::{CommandDispatcher, CommandEnvelope};
pub use error::{HostError, HostResult};
pub use launcher::{LaunchOutcome, Launcher, ProcessLauncher};
pub use protocol::{FramedChannel, ResultEnvelope};

use tokio::io::{AsyncRead, AsyncWrite, Stdin, Stdout};

/// Native messaging host: framing channel plus command dispatcher.
pub struct MessagingHost<R, W> {
    channel: FramedChannel<R, W>,
    dispatcher: CommandDispatcher,
}

impl MessagingHost<Stdin, Stdout> {
    /// Create a host bound to the process's stdin/stdout.
    pub fn over_stdio(config: &HostConfig) -> Self {
        Self::new(FramedChannel::over_stdio(config), CommandDispatcher::new())
    }
}

impl<R, W> MessagingHost<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a host over an explicit channel and dispatcher.
    pub fn new(channel: FramedChannel<R, W>, dispatcher: CommandDispatcher) -> Self {
        Self {
            channel,
            dispatcher,
        }
    }

    /// Run the message loop until the input stream ends.
    ///
    /// Reads one frame at a time, dispatches it, and writes back whatever
    /// envelopes the command produced. Undecodable bodies are logged and
    /// skipped; framing errors terminate the loop because the stream cannot
    /// be resynchronized. Both terminations return `Ok(())` so the process
    /// exits with status 0 - errors travel to the extension as payload, not
    /// as exit codes.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        tracing::info!("message loop started");

        loop {
            let body = match self.channel.read_message().await {
                Ok(Some(body)) => body,
                Ok(None) => {
                    tracing::info!("input stream closed, shutting down");
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        code = e.error_code(),
                        "unrecoverable read error, terminating channel"
                    );
                    return Ok(());
                }
            };

            let envelopes = match self.dispatcher.dispatch(&body).await {
                Ok(envelopes) => envelopes,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        code = e.error_code(),
                        "undecodable message ignored"
                    );
                    continue;
                }
            };

            for envelope in &envelopes {
                if let Err(e) = self.channel.write_envelope(envelope).await {
                    // The peer is likely gone; the next read will see EOF.
                    tracing::error!(error = %e, "failed to send response");
                }
            }
        }
    }
}

/// Run the native messaging host over stdin/stdout.
///
/// This is the main entry point: it blocks until the extension closes the
/// input stream (or the framing desynchronizes) and then returns cleanly.
///
/// # Errors
///
/// Only fails on setup problems; wire-level and launch errors are reported
/// to the extension and never surface here.
pub async fn run_host(config: HostConfig) -> anyhow::Result<()> {
    let mut host = MessagingHost::over_stdio(&config);
    host.run().await
}
