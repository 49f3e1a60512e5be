//! Integration tests for the ai-search binary.
//! Uses assert_cmd to run the binary, a real temp config, and an in-process
//! WebSocket server. No mocks.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write as _;
use std::net::TcpListener as StdTcpListener;

/// Pick a free port by binding to :0 and extracting the assigned port.
fn free_port() -> u16 {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Write a minimal YAML config to a temp file pointing at `port`.
fn write_config(dir: &tempfile::TempDir, port: u16) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(
        f,
        "server:\n  url: ws://127.0.0.1:{}/ws\nsearch:\n  provider: wikipedia\nui:\n  completion_grace_ms: 20",
        port
    )
    .unwrap();
    path
}

/// Spawn a minimal WebSocket server that accepts one connection, waits for the
/// request, then streams sources, two tokens, suggestions and complete.
fn spawn_test_server(port: u16) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
                .await
                .unwrap();

            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            let (mut write, mut read) = ws.split();

            use futures_util::StreamExt;
            let _ = read.next().await;

            use futures_util::SinkExt;
            use tokio_tungstenite::tungstenite::Message;
            let frames = [
                r#"{"type":"status","message":"Searching with wikipedia..."}"#,
                r#"{"type":"sources","data":[{"title":"Rust","url":"https://www.rust-lang.org/learn"},{"title":"Odd","url":"not a url"}]}"#,
                r#"{"type":"token","data":"Test "}"#,
                r#"{"type":"token","data":"answer."}"#,
                r#"{"type":"suggestions","data":["What is cargo?"]}"#,
                r#"{"type":"complete"}"#,
            ];
            for text in frames {
                write.send(Message::Text(text.into())).await.unwrap();
            }

            // Small delay so the client can read before we drop.
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        });
    })
}

/// Like `spawn_test_server`, but answers from the cache and sends the
/// suggestions only after a pause longer than the configured grace delay.
fn spawn_cached_server(port: u16) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            use futures_util::{SinkExt, StreamExt};
            use tokio_tungstenite::tungstenite::Message;

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
                .await
                .unwrap();
            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            let (mut write, mut read) = ws.split();
            let _ = read.next().await;

            let cached = r#"{"type":"cached","data":{"answer":"Cached answer.","sources":[],"query":"q"}}"#;
            let status = r#"{"type":"status","message":"Generating follow-up questions..."}"#;
            write.send(Message::Text(cached.into())).await.unwrap();
            write.send(Message::Text(status.into())).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            let suggestions = r#"{"type":"suggestions","data":["Why cache?"]}"#;
            write.send(Message::Text(suggestions.into())).await.unwrap();

            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        });
    })
}

#[test]
fn prints_streamed_answer_sources_and_suggestions() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);

    let _server = spawn_test_server(port);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("ai-search"));
    cmd.arg("--config")
        .arg(&config_path)
        .write_stdin("What is Rust?\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Test answer."))
        .stdout(predicate::str::contains("[1] Rust (www.rust-lang.org)"))
        .stdout(predicate::str::contains("[2] Odd (unknown)"))
        .stdout(predicate::str::contains(":1 What is cargo?"))
        .stderr(predicate::str::contains("Searching with wikipedia..."));
}

#[test]
fn config_env_var_is_used() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);

    let _server = spawn_test_server(port);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("ai-search"));
    cmd.env("AI_SEARCH_CONFIG", &config_path)
        .write_stdin("What is Rust?\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Test answer."));
}

#[test]
fn positional_query_argument() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);

    let _server = spawn_test_server(port);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("ai-search"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("--provider")
        .arg("duckduckgo")
        .arg("What")
        .arg("is")
        .arg("Rust?");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Test answer."));
}

#[test]
fn blank_query_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, free_port());

    let mut cmd = Command::from(cargo_bin_cmd!("ai-search"));
    cmd.arg("--config").arg(&config_path).write_stdin("   \n");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no question provided"));
}

#[test]
fn blank_positional_query_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, free_port());

    let mut cmd = Command::from(cargo_bin_cmd!("ai-search"));
    cmd.arg("--config").arg(&config_path).arg("   ").arg("\t");

    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no question provided"));
}

#[test]
fn server_down_shows_error() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);

    let mut cmd = Command::from(cargo_bin_cmd!("ai-search"));
    cmd.arg("--config")
        .arg(&config_path)
        .write_stdin("hello\n");

    cmd.assert()
        .failure()
        .stderr(predicate::str::is_match("(?i)(connect|error|refused)").unwrap());
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::from(cargo_bin_cmd!("ai-search"));
    cmd.arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .arg("hello");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn interactive_mode_finishes_query_in_flight_at_end_of_input() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);

    let _server = spawn_test_server(port);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("ai-search"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("--interactive")
        .write_stdin("\n:3\nWhat is Rust?\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Test answer."))
        .stderr(predicate::str::contains("No suggestion :3"));
}

#[test]
fn cached_answer_prints_suggestions_that_arrive_late() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);

    let _server = spawn_cached_server(port);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("ai-search"));
    cmd.arg("--config").arg(&config_path).arg("q");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Cached answer."))
        .stdout(predicate::str::contains(":1 Why cache?"));
}
