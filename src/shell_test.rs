use super::*;
use std::sync::Arc;

use crate::registry::{ConnectionSettings, Registry};
use crate::transport::testing::RecordingTransport;

async fn connected_router(transport: &RecordingTransport) -> Router {
    let mut router = Router::new(Registry::new(
        Arc::new(transport.clone()),
        ConnectionSettings::default(),
    ));
    router
        .registry_mut()
        .connect("default", "tcp://x:1")
        .await
        .unwrap();
    router
}

async fn session(transport: &RecordingTransport, input: &str) -> String {
    let router = connected_router(transport).await;
    let mut shell = Shell::new(router, input.as_bytes(), Vec::new());
    shell.run().await.unwrap();
    String::from_utf8(shell.into_output()).unwrap()
}

#[tokio::test]
async fn session_prints_replies_and_errors_then_stops_at_exit() {
    let transport = RecordingTransport::new();
    let output = session(
        &transport,
        "status\n\n   \nghost/status\n.port-list\n.exit\nstatus\n",
    )
    .await;

    assert!(output.starts_with(PROMPT));
    assert!(output.contains("\"cmd\": \"status\""), "{output}");
    assert!(output.contains("error: no connection named 'ghost'"), "{output}");
    assert!(output.contains("\"default\": \"tcp://x:1\""), "{output}");
    // one prompt per line read, nothing after .exit
    assert_eq!(output.matches(PROMPT).count(), 6);
    assert_eq!(transport.sent().len(), 1);
    assert!(transport.live_requests().is_empty());
}

#[tokio::test]
async fn end_of_input_disconnects_everything() {
    let transport = RecordingTransport::new();
    let output = session(&transport, "status\n").await;

    assert!(output.ends_with(&format!("{PROMPT}\n")));
    assert!(transport.live_requests().is_empty());
}

#[tokio::test]
async fn string_replies_are_printed_bare() {
    let transport = RecordingTransport::new();
    let router = connected_router(&transport).await;
    let mut shell = Shell::new(router, &b""[..], Vec::new());

    assert!(shell.run_line(".help").await.unwrap());
    assert!(shell.run_line(".port-connect other 4000").await.unwrap());
    assert!(shell.router().registry().contains("other"));
    assert!(!shell.run_line(".exit").await.unwrap());
    assert!(shell.router().registry().is_empty());

    let output = String::from_utf8(shell.into_output()).unwrap();
    assert!(output.starts_with("administrative commands:\n"));
    assert!(!output.contains('"'));
}

#[tokio::test]
async fn malformed_literal_is_printed_and_session_continues() {
    let transport = RecordingTransport::new();
    let output = session(&transport, "set {a:\nstatus\n.exit\n").await;

    assert!(output.contains("error: malformed literal"), "{output}");
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn raw_tail_keeps_trailing_whitespace() {
    let transport = RecordingTransport::new();
    session(&transport, "echo a  \n.exit\n").await;

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.cmd, "echo");
    assert_eq!(sent[0].1.data, serde_json::json!("a  "));
}
