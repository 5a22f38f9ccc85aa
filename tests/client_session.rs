//! Integration tests for the client session against a running server.

mod common;

use std::time::Duration;

use relay_chat::client::{ClientSession, ConnectionStatus, LineKind, MemoryRenderer};

use common::{start_server, start_server_on, wait_for, wait_for_connections, TestClient};

fn lines_with(recorder: &MemoryRenderer, kind: LineKind, text: &str) -> usize {
    recorder
        .lines()
        .iter()
        .filter(|line| line.kind == kind && line.text == text)
        .count()
}

#[tokio::test]
async fn test_round_trip_classifies_own_and_incoming() {
    let (addr, relay) = start_server().await;
    let url = format!("http://{addr}");

    let alice_view = MemoryRenderer::new();
    let (alice, alice_handle) = ClientSession::new(&url, "Alice", alice_view.clone()).unwrap();
    let alice_task = tokio::spawn(alice.run());
    assert!(wait_for(|| lines_with(&alice_view, LineKind::System, "Alice joined.") == 1).await);

    let bob_view = MemoryRenderer::new();
    let (bob, bob_handle) = ClientSession::new(&url, "Bob", bob_view.clone()).unwrap();
    let bob_task = tokio::spawn(bob.run());
    assert!(wait_for(|| lines_with(&bob_view, LineKind::System, "Bob joined.") == 1).await);
    assert!(wait_for(|| lines_with(&alice_view, LineKind::System, "Bob joined.") == 1).await);
    assert!(wait_for_connections(&relay, 2).await);

    assert!(alice_handle.send_message("  hi  "));

    // Local render plus the relayed echo, both classified as own.
    assert!(wait_for(|| lines_with(&alice_view, LineKind::Own, "hi") == 2).await);
    assert!(wait_for(|| lines_with(&bob_view, LineKind::Incoming, "hi") == 1).await);
    assert_eq!(lines_with(&bob_view, LineKind::Own, "hi"), 0);

    alice_handle.shutdown();
    bob_handle.shutdown();
    alice_task.await.unwrap();
    bob_task.await.unwrap();

    assert_eq!(alice_view.last_status(), Some(ConnectionStatus::Disconnected));
}

#[tokio::test]
async fn test_history_rendered_on_connect() {
    let (addr, _relay) = start_server().await;

    let (mut raw, _) = TestClient::connect_with_history(addr).await;
    raw.send_raw(r#"{"type":"message","name":"Carol","text":"first","time":1}"#)
        .await;
    raw.send_raw(r#"{"type":"message","name":"Dave","text":"second","time":2}"#)
        .await;
    raw.recv().await;
    raw.recv().await;

    let view = MemoryRenderer::new();
    let (session, handle) = ClientSession::new(&format!("http://{addr}"), "Dave", view.clone())
        .unwrap();
    let task = tokio::spawn(session.run());

    assert!(wait_for(|| view.lines().len() >= 2).await);
    let lines = view.lines();
    assert_eq!(lines[0].text, "first");
    assert_eq!(lines[0].kind, LineKind::Incoming);
    assert_eq!(lines[1].text, "second");
    assert_eq!(lines[1].kind, LineKind::Own);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn test_message_while_disconnected_is_only_local() {
    let view = MemoryRenderer::new();
    let (session, handle) = ClientSession::new("http://127.0.0.1:1", "Alice", view.clone())
        .unwrap();
    let session = session.with_reconnect_delay(Duration::from_secs(60));
    let task = tokio::spawn(session.run());

    assert!(wait_for(|| view.last_status() == Some(ConnectionStatus::Disconnected)).await);
    assert!(handle.send_message("offline"));
    assert!(wait_for(|| lines_with(&view, LineKind::Own, "offline") == 1).await);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn test_reconnects_after_fixed_delay() {
    // Reserve a free port, then release it so the first attempts fail.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let view = MemoryRenderer::new();
    let (session, handle) =
        ClientSession::new(&format!("http://127.0.0.1:{port}"), "Alice", view.clone()).unwrap();
    let session = session.with_reconnect_delay(Duration::from_millis(100));
    let task = tokio::spawn(session.run());

    assert!(wait_for(|| view.statuses().contains(&ConnectionStatus::Disconnected)).await);

    let (_addr, relay) = start_server_on(port).await;

    assert!(wait_for(|| view.last_status() == Some(ConnectionStatus::Connected)).await);
    assert!(wait_for_connections(&relay, 1).await);
    assert!(wait_for(|| lines_with(&view, LineKind::System, "Alice joined.") == 1).await);

    let statuses = view.statuses();
    assert_eq!(statuses[0], ConnectionStatus::Connecting);
    assert!(statuses.iter().filter(|s| **s == ConnectionStatus::Connecting).count() >= 2);

    handle.shutdown();
    task.await.unwrap();
}
