//! Command decoding and dispatch.
//!
//! Decodes one message body into a Command Envelope and drives the launcher
//! for the single recognized action. The wire format double-encodes JSON:
//! the frame body is a JSON string literal whose contents are another
//! JSON-encoded object, so recovering the envelope takes two decode passes.
//! Collapsing this to a single decode would break the unmodified extension
//! on the other end of the pipe.

use crate::error::{HostError, HostResult};
use crate::launcher::{Launcher, ProcessLauncher};
use crate::protocol::ResultEnvelope;
use serde::Deserialize;
use std::sync::Arc;

/// Incoming command after both decode passes.
///
/// All fields are optional at the schema level: a message without `action`
/// is a silent no-op, not an error, so absence must be representable.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandEnvelope {
    /// Requested action; only `"dartium"` is recognized
    pub action: Option<String>,

    /// Filesystem path to the browser executable
    pub path: Option<String>,

    /// URL to open
    pub url: Option<String>,
}

/// Dispatches decoded commands to the launcher.
pub struct CommandDispatcher {
    launcher: Arc<dyn Launcher>,
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandDispatcher {
    /// Create a dispatcher backed by the real process launcher.
    pub fn new() -> Self {
        Self {
            launcher: Arc::new(ProcessLauncher),
        }
    }

    /// Create a dispatcher with a custom launcher.
    pub fn with_launcher(launcher: Arc<dyn Launcher>) -> Self {
        Self { launcher }
    }

    /// Decode a frame body and execute the command it carries.
    ///
    /// Returns the Result Envelopes to send back: empty for every ignored
    /// message (missing `action`, unrecognized `action`, path failing the
    /// browser suffix check), one envelope for a successful or unspawnable
    /// launch, two for a launch that exited nonzero.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Decode`] when the body is not UTF-8 or either
    /// JSON decode pass fails. The message loop logs these and keeps going.
    pub async fn dispatch(&self, body: &[u8]) -> HostResult<Vec<ResultEnvelope>> {
        let request_id = uuid::Uuid::new_v4();

        let text = std::str::from_utf8(body)
            .map_err(|e| HostError::decode(format!("Invalid UTF-8 in message: {}", e)))?;

        // First pass unwraps the outer string literal, second parses the
        // envelope it contains.
        let inner: String = serde_json::from_str(text)
            .map_err(|e| HostError::decode(format!("Message body is not a JSON string: {}", e)))?;
        let envelope: CommandEnvelope = serde_json::from_str(&inner)
            .map_err(|e| HostError::decode(format!("Invalid command envelope: {}", e)))?;

        let Some(action) = envelope.action.as_deref() else {
            tracing::debug!(request_id = %request_id, "message without action ignored");
            return Ok(Vec::new());
        };

        if action != "dartium" {
            tracing::debug!(
                request_id = %request_id,
                action = %action,
                "unrecognized action ignored"
            );
            return Ok(Vec::new());
        }

        let (Some(path), Some(url)) = (envelope.path.as_deref(), envelope.url.as_deref()) else {
            tracing::warn!(
                request_id = %request_id,
                "dartium command missing path or url, ignored"
            );
            return Ok(Vec::new());
        };

        // Suffix match on the whole lower-cased path; no separator or
        // extension normalization.
        let lowered = path.to_lowercase();
        if !lowered.ends_with("chromium") && !lowered.ends_with("chrome") {
            tracing::debug!(
                request_id = %request_id,
                path = %path,
                "path is not a chromium/chrome binary, ignored"
            );
            return Ok(Vec::new());
        }

        tracing::info!(
            request_id = %request_id,
            path = %path,
            url = %url,
            "launching browser"
        );

        let outcome = self.launcher.launch(path, url).await;

        tracing::info!(
            request_id = %request_id,
            outcome = %outcome,
            "launch finished"
        );

        Ok(outcome.into_envelopes())
    }
}
