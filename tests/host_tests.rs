//! Integration tests for the messaging host.
//!
//! These drive the real host loop end-to-end over in-memory duplex streams:
//! frames go in exactly as a browser would send them, and assertions run
//! against the raw frames that come back.

use dartium_messaging::{CommandDispatcher, FramedChannel, HostConfig, MessagingHost};
use serde_json::json;
use tokio::io::{duplex, split, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

type ClientChannel = FramedChannel<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

/// Start a host over one end of a duplex pair; return its join handle and a
/// client channel speaking the same framing from the other end.
fn start_host() -> (JoinHandle<anyhow::Result<()>>, ClientChannel) {
    let config = HostConfig::default();
    let (host_side, client_side) = duplex(64 * 1024);

    let (host_read, host_write) = split(host_side);
    let channel = FramedChannel::new(host_read, host_write, config.max_message_size);
    let mut host = MessagingHost::new(channel, CommandDispatcher::new());
    let handle = tokio::spawn(async move { host.run().await });

    let (client_read, client_write) = split(client_side);
    let client = FramedChannel::new(client_read, client_write, config.max_message_size);

    (handle, client)
}

/// Encode a command the way the extension does: JSON, then JSON again.
fn double_encode(value: &serde_json::Value) -> Vec<u8> {
    let once = serde_json::to_string(value).unwrap();
    serde_json::to_string(&once).unwrap().into_bytes()
}

#[tokio::test]
async fn test_end_of_stream_terminates_cleanly() {
    let (handle, client) = start_host();

    drop(client);

    let result = handle.await.expect("host task should not panic");
    assert!(result.is_ok(), "host should exit cleanly on end-of-stream");
}

#[tokio::test]
async fn test_truncated_length_prefix_terminates_without_output() {
    let config = HostConfig::default();
    let (host_side, client_side) = duplex(1024);

    let (host_read, host_write) = split(host_side);
    let channel = FramedChannel::new(host_read, host_write, config.max_message_size);
    let mut host = MessagingHost::new(channel, CommandDispatcher::new());
    let handle = tokio::spawn(async move { host.run().await });

    let (mut client_read, mut client_write) = split(client_side);
    client_write.write_all(&[42u8, 0]).await.unwrap();
    // Closing the write side signals EOF to the host. `split`'s WriteHalf has
    // no Drop, so an explicit shutdown (not a bare drop) is required.
    client_write.shutdown().await.unwrap();
    drop(client_write);

    let result = handle.await.expect("host task should not panic");
    assert!(result.is_ok(), "desynchronized framing still exits with success");

    // Nothing was sent back before termination.
    let mut buf = Vec::new();
    let n = tokio::io::AsyncReadExt::read_to_end(&mut client_read, &mut buf)
        .await
        .unwrap();
    assert_eq!(n, 0);
}

#[cfg(unix)]
mod launches {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// A fake browser script; the file name must survive the dispatcher's
    /// chromium/chrome suffix check.
    fn fake_browser(dir: &Path, body: &str) -> PathBuf {
        let script = dir.join("fake-chrome");
        std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    fn launch_command(path: &Path) -> Vec<u8> {
        double_encode(&json!({
            "action": "dartium",
            "path": path.to_str().unwrap(),
            "url": "http://localhost:8080/index.html"
        }))
    }

    #[tokio::test]
    async fn test_successful_launch_emits_single_result() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_browser(dir.path(), "exit 0");
        let (handle, mut client) = start_host();

        client.write_message(&launch_command(&script)).await.unwrap();

        let frame = client.read_message().await.unwrap().unwrap();
        assert_eq!(frame, br#"{"result":"dartium launched"}"#);

        drop(client);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_failed_launch_emits_stdout_then_stderr_errors() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_browser(dir.path(), "echo warn\necho fatal >&2\nexit 1");
        let (handle, mut client) = start_host();

        client.write_message(&launch_command(&script)).await.unwrap();

        let first = client.read_message().await.unwrap().unwrap();
        assert_eq!(first, br#"{"error":"warn"}"#);
        let second = client.read_message().await.unwrap().unwrap();
        assert_eq!(second, br#"{"error":"fatal"}"#);

        drop(client);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unspawnable_binary_emits_single_error() {
        let (handle, mut client) = start_host();

        let body = double_encode(&json!({
            "action": "dartium",
            "path": "/nonexistent/bin/chromium",
            "url": "http://example.com"
        }));
        client.write_message(&body).await.unwrap();

        let frame = client.read_message().await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&frame).unwrap();
        assert!(value.get("error").is_some(), "expected error envelope, got {value}");
        assert!(value.get("result").is_none());

        drop(client);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_ignored_messages_produce_no_frames_and_keep_loop_alive() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_browser(dir.path(), "exit 0");
        let (handle, mut client) = start_host();

        // None of these may produce a frame: wrong suffix, unknown action,
        // missing action.
        client
            .write_message(&double_encode(&json!({
                "action": "dartium",
                "path": "/opt/firefox",
                "url": "http://example.com"
            })))
            .await
            .unwrap();
        client
            .write_message(&double_encode(&json!({
                "action": "reboot",
                "path": "/usr/bin/chrome",
                "url": "http://example.com"
            })))
            .await
            .unwrap();
        client
            .write_message(&double_encode(&json!({"url": "http://example.com"})))
            .await
            .unwrap();

        // A real launch afterwards: the first frame back proves the ignored
        // messages were answered with silence and the loop survived them.
        client.write_message(&launch_command(&script)).await.unwrap();

        let frame = client.read_message().await.unwrap().unwrap();
        assert_eq!(frame, br#"{"result":"dartium launched"}"#);

        drop(client);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_undecodable_body_keeps_loop_alive() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_browser(dir.path(), "exit 0");
        let (handle, mut client) = start_host();

        // Single-encoded object: valid JSON, wrong wire form.
        client
            .write_message(&serde_json::to_vec(&json!({"action": "dartium"})).unwrap())
            .await
            .unwrap();
        // Not even UTF-8.
        client.write_message(&[0xFF, 0xFE, 0xFD]).await.unwrap();

        client.write_message(&launch_command(&script)).await.unwrap();

        let frame = client.read_message().await.unwrap().unwrap();
        assert_eq!(frame, br#"{"result":"dartium launched"}"#);

        drop(client);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_spaced_chrome_path_reaches_launcher() {
        // "/usr/bin/Google Chrome" passes the suffix check, then shell-word
        // splitting breaks it apart and the spawn fails: one error envelope.
        let (handle, mut client) = start_host();

        let body = double_encode(&json!({
            "action": "dartium",
            "path": "/usr/bin/Google Chrome",
            "url": "http://example.com"
        }));
        client.write_message(&body).await.unwrap();

        let frame = client.read_message().await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&frame).unwrap();
        assert!(value.get("error").is_some(), "expected error envelope, got {value}");

        drop(client);
        handle.await.unwrap().unwrap();
    }
}
