//! Browser native messaging framing protocol.
//!
//! Implements the stdio wire format used between a browser extension and its
//! native messaging host: each frame is a 4-byte native-byte-order length
//! prefix followed by that many bytes of UTF-8 JSON payload.

use crate::config::HostConfig;
use crate::error::{HostError, HostResult};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, Stdin, Stdout};

/// Outgoing response to the extension.
///
/// Exactly one of `result` or `error` appears on the wire; the enum makes
/// any other shape unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultEnvelope {
    /// Successful operation, with a human-readable result string
    #[serde(rename = "result")]
    Result(String),

    /// Failed operation, with a human-readable error string
    #[serde(rename = "error")]
    Error(String),
}

/// Length-prefixed frame channel over a reader/writer pair.
///
/// Generic over the underlying streams so the same code drives real stdio in
/// production and in-memory duplex pairs in tests.
pub struct FramedChannel<R, W> {
    reader: R,
    writer: W,
    max_message_size: usize,
}

impl FramedChannel<Stdin, Stdout> {
    /// Create a channel bound to the process's stdin/stdout.
    pub fn over_stdio(config: &HostConfig) -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout(), config.max_message_size)
    }
}

impl<R, W> FramedChannel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a channel over an arbitrary reader/writer pair.
    pub fn new(reader: R, writer: W, max_message_size: usize) -> Self {
        Self {
            reader,
            writer,
            max_message_size,
        }
    }

    /// Read one framed message.
    ///
    /// Blocks until a full frame arrives. Returns `Ok(None)` when the stream
    /// is cleanly closed at a frame boundary (zero bytes where a length
    /// prefix was expected) - the caller should shut down.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Protocol`] if the stream closes partway through a
    /// length prefix or body, or if the declared length exceeds the
    /// configured maximum. These desynchronize the channel permanently.
    pub async fn read_message(&mut self) -> HostResult<Option<Vec<u8>>> {
        let mut length_bytes = [0u8; 4];
        let mut filled = 0;

        // A zero-byte read before any prefix byte is a clean end-of-stream;
        // after the first byte it is a truncated frame.
        while filled < 4 {
            let n = self.reader.read(&mut length_bytes[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(HostError::protocol(format!(
                    "stream closed after {} of 4 length prefix bytes",
                    filled
                )));
            }
            filled += n;
        }

        let message_length = u32::from_ne_bytes(length_bytes) as usize;

        if message_length > self.max_message_size {
            return Err(HostError::protocol(format!(
                "Message length {} exceeds maximum size {}",
                message_length, self.max_message_size
            )));
        }

        // Zero-length bodies are legal; an empty write must round-trip.
        let mut message_bytes = vec![0u8; message_length];
        self.reader
            .read_exact(&mut message_bytes)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    HostError::protocol(format!(
                        "stream closed inside a {} byte message body",
                        message_length
                    ))
                } else {
                    HostError::Io(e)
                }
            })?;

        Ok(Some(message_bytes))
    }

    /// Write one framed message and flush it.
    ///
    /// The length prefix is the byte length of `body` (not a character
    /// count), in native byte order. The flush guarantees the peer observes
    /// the frame immediately.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Protocol`] if `body` exceeds the configured
    /// maximum, or an I/O error if the write fails.
    pub async fn write_message(&mut self, body: &[u8]) -> HostResult<()> {
        if body.len() > self.max_message_size {
            return Err(HostError::protocol(format!(
                "Response message length {} exceeds maximum size {}",
                body.len(),
                self.max_message_size
            )));
        }

        let length = body.len() as u32;
        self.writer.write_all(&length.to_ne_bytes()).await?;
        self.writer.write_all(body).await?;
        self.writer.flush().await?;

        Ok(())
    }

    /// Serialize an envelope and write it as one frame.
    pub async fn write_envelope(&mut self, envelope: &ResultEnvelope) -> HostResult<()> {
        let body = serde_json::to_vec(envelope)?;
        self.write_message(&body).await
    }
}
