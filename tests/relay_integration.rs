//! Integration tests for the chat relay over real WebSocket connections.

mod common;

use std::time::Duration;

use relay_chat::datetime::now_millis;
use serde_json::json;

use common::{start_server, wait_for_connections, TestClient};

#[tokio::test]
async fn test_new_connection_receives_empty_history() {
    let (addr, _relay) = start_server().await;

    let mut client = TestClient::connect(addr).await;
    let event = client.recv().await;

    assert_eq!(event, json!({"type": "history", "items": []}));
}

#[tokio::test]
async fn test_message_broadcast_and_history_replay() {
    let (addr, _relay) = start_server().await;

    let (mut alice, items) = TestClient::connect_with_history(addr).await;
    assert!(items.is_empty());
    let (mut bob, _) = TestClient::connect_with_history(addr).await;

    let message = json!({"type": "message", "name": "Alice", "text": "hi", "time": 1700000000000i64});
    alice.send_json(message.clone()).await;

    // Sender gets its own echo; other clients get the same event.
    assert_eq!(alice.recv().await, message);
    assert_eq!(bob.recv().await, message);

    let (_carol, items) = TestClient::connect_with_history(addr).await;
    assert_eq!(
        items,
        vec![json!({"name": "Alice", "text": "hi", "time": 1700000000000i64})]
    );
}

#[tokio::test]
async fn test_join_broadcasts_system_message() {
    let (addr, _relay) = start_server().await;

    let (mut alice, _) = TestClient::connect_with_history(addr).await;
    let (mut bob, _) = TestClient::connect_with_history(addr).await;

    let before = now_millis();
    alice.send_json(json!({"type": "join", "name": "Alice"})).await;

    for client in [&mut alice, &mut bob] {
        let event = client.recv().await;
        assert_eq!(event["type"], "system");
        assert_eq!(event["text"], "Alice joined.");
        assert!(event["time"].as_i64().unwrap() >= before);
    }

    // Join events are not stored.
    let (_carol, items) = TestClient::connect_with_history(addr).await;
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_message_without_time_gets_server_timestamp() {
    let (addr, relay) = start_server().await;
    let (mut alice, _) = TestClient::connect_with_history(addr).await;

    let before = now_millis();
    alice
        .send_json(json!({"type": "message", "name": "Alice", "text": "no clock"}))
        .await;

    let event = alice.recv().await;
    let time = event["time"].as_i64().unwrap();
    assert!(time >= before);

    let history = relay.history_snapshot().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].time, time);
}

#[tokio::test]
async fn test_zero_time_is_replaced() {
    let (addr, _relay) = start_server().await;
    let (mut alice, _) = TestClient::connect_with_history(addr).await;

    let before = now_millis();
    alice
        .send_json(json!({"type": "message", "name": "Alice", "text": "zero", "time": 0}))
        .await;

    let event = alice.recv().await;
    assert!(event["time"].as_i64().unwrap() >= before);
}

#[tokio::test]
async fn test_false_and_empty_time_are_replaced() {
    let (addr, relay) = start_server().await;
    let (mut alice, _) = TestClient::connect_with_history(addr).await;

    let before = now_millis();
    alice
        .send_json(json!({"type": "message", "name": "Alice", "text": "f", "time": false}))
        .await;
    alice
        .send_json(json!({"type": "message", "name": "Alice", "text": "e", "time": ""}))
        .await;

    for text in ["f", "e"] {
        let event = alice.recv().await;
        assert_eq!(event["text"], text);
        assert!(event["time"].as_i64().unwrap() >= before);
    }
    assert_eq!(relay.history_snapshot().await.len(), 2);
}

#[tokio::test]
async fn test_malformed_input_is_ignored() {
    let (addr, relay) = start_server().await;
    let (mut alice, _) = TestClient::connect_with_history(addr).await;

    alice.send_raw("this is not json").await;
    alice.send_raw(r#"{"type": "typing", "name": "Alice"}"#).await;
    alice.send_raw(r#"{"type": "message", "name": "Alice"}"#).await;
    alice.send_raw(r#"{"text": "no type"}"#).await;

    assert!(alice.try_recv(Duration::from_millis(200)).await.is_none());
    assert!(relay.history_snapshot().await.is_empty());

    // The connection stays usable.
    let message = json!({"type": "message", "name": "Alice", "text": "still here", "time": 5});
    alice.send_json(message.clone()).await;
    assert_eq!(alice.recv().await, message);
    assert_eq!(relay.history_snapshot().await.len(), 1);
}

#[tokio::test]
async fn test_history_keeps_last_100_messages() {
    let (addr, _relay) = start_server().await;
    let (mut alice, _) = TestClient::connect_with_history(addr).await;

    for i in 1..=101 {
        alice
            .send_json(json!({"type": "message", "name": "Alice", "text": format!("m{i}"), "time": i}))
            .await;
    }
    for _ in 1..=101 {
        alice.recv().await;
    }

    let (_bob, items) = TestClient::connect_with_history(addr).await;
    assert_eq!(items.len(), 100);
    assert_eq!(items[0]["text"], "m2");
    assert_eq!(items[99]["text"], "m101");
}

#[tokio::test]
async fn test_disconnect_unregisters_connection() {
    let (addr, relay) = start_server().await;

    let (alice, _) = TestClient::connect_with_history(addr).await;
    let (mut bob, _) = TestClient::connect_with_history(addr).await;
    assert_eq!(relay.connection_count().await, 2);

    alice.close().await;
    assert!(wait_for_connections(&relay, 1).await);

    // No departure event is sent.
    assert!(bob.try_recv(Duration::from_millis(200)).await.is_none());
}
