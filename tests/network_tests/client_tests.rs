//! Tests for EngineClient (the dispatcher)
//!
//! These tests verify:
//! - Pooled dispatch and reply normalization
//! - Fallback sockets when the pool is saturated
//! - Error taxonomy seen by callers
//! - Request timeouts

use std::sync::Arc;
use std::time::Duration;

use dbwire::{Action, ClientConfig, Command, EngineClient, Response, WireError};
use serde_json::{json, Map};

use crate::support::{bounded, closed_port, wait_for, Reply, StubEngine};

// =============================================================================
// Helper Functions
// =============================================================================

/// `find` is slow, everything else answers immediately
async fn slow_find_stub() -> StubEngine {
    StubEngine::start(|_, command| match command["action"].as_str() {
        Some("find") => Reply::Delayed(Duration::from_millis(300), json!([{"slow": true}])),
        _ => Reply::Json(json!({"status": "ok", "message": "pong"})),
    })
    .await
}

// =============================================================================
// Dispatch Tests
// =============================================================================

#[tokio::test]
async fn test_send_command_wire_shape() {
    let stub = StubEngine::echo().await;
    let client = EngineClient::new(stub.config(2)).unwrap();

    let command = Command::new(Action::UpdateOne)
        .user("u1")
        .database("shop")
        .collection("orders")
        .filter(json!({"id": "7"}))
        .update(json!({"x": 1}));
    bounded(client.send_command(&command)).await.unwrap();

    assert_eq!(
        stub.received(),
        vec![json!({
            "action": "updateOne",
            "userId": "u1",
            "dbName": "shop",
            "collection": "orders",
            "filter": {"id": "7"},
            "update": {"x": 1}
        })]
    );
}

#[tokio::test]
async fn test_send_command_passes_object_replies_through() {
    let stub = StubEngine::start(|_, _| Reply::Json(json!({"status": "ok", "created": "shop"}))).await;
    let client = EngineClient::new(stub.config(1)).unwrap();

    let reply = bounded(client.send_command(&Command::new(Action::CreateDatabase).database("shop")))
        .await
        .unwrap();

    let obj = reply.as_object().unwrap();
    assert_eq!(obj["created"], json!("shop"));
}

#[tokio::test]
async fn test_many_concurrent_commands_all_complete() {
    let stub = StubEngine::echo().await;
    let client = Arc::new(EngineClient::new(stub.config(2)).unwrap());

    let mut handles = Vec::new();
    for i in 0..20 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            let command = Command::new(Action::Insert).data(json!({"id": i}));
            client.send_command(&command).await
        }));
    }

    for handle in handles {
        bounded(handle).await.unwrap().unwrap();
    }
    assert_eq!(stub.received().len(), 20);
}

// =============================================================================
// Fallback Tests
// =============================================================================

#[tokio::test]
async fn test_saturated_pool_falls_back_to_one_shot_socket() {
    let stub = slow_find_stub().await;
    let client = Arc::new(EngineClient::new(stub.config(1)).unwrap());

    let slow = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.send_command(&Command::new(Action::Find)).await })
    };
    assert!(wait_for(|| client.pool().available() == 0).await);

    // Pool of one is busy: this goes over a fresh socket and still succeeds
    let fast = bounded(client.send_command(&Command::ping())).await.unwrap();
    assert_eq!(fast.as_object().unwrap()["message"], json!("pong"));
    assert!(client.pool().connections()[0].is_busy());

    let slow = bounded(slow).await.unwrap().unwrap();
    assert_eq!(slow, Response::Documents(vec![json!({"slow": true})]));
}

// =============================================================================
// Error Tests
// =============================================================================

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let port = closed_port().await;
    let config = ClientConfig::builder().port(port).pool_size(1).build();
    let client = EngineClient::new(config).unwrap();

    let err = bounded(client.send_command(&Command::ping())).await.unwrap_err();

    assert!(err.is_transport());
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn test_unparsable_reply_is_invalid_response() {
    let stub = StubEngine::start(|_, _| Reply::Raw(b"{\"status\":".to_vec())).await;
    let client = EngineClient::new(stub.config(1)).unwrap();

    let err = bounded(client.send_command(&Command::ping())).await.unwrap_err();

    assert!(matches!(err, WireError::InvalidResponse(_)));
    assert!(err.to_string().starts_with("Invalid engine response"));
}

#[tokio::test]
async fn test_empty_reply_is_empty_object() {
    let stub = StubEngine::start(|_, _| Reply::Raw(Vec::new())).await;
    let client = EngineClient::new(stub.config(1)).unwrap();

    let reply = bounded(client.send_command(&Command::ping())).await.unwrap();

    assert_eq!(reply, Response::Object(Map::new()));
    assert_eq!(stub.actions(), vec!["ping"]);
}

#[tokio::test]
async fn test_fallback_empty_reply_is_empty_object() {
    // The saturated pool sends ping over a fallback socket the engine closes unanswered
    let stub = StubEngine::start(|_, command| match command["action"].as_str() {
        Some("find") => Reply::Delayed(Duration::from_millis(200), json!([])),
        _ => Reply::Drop,
    })
    .await;
    let client = Arc::new(EngineClient::new(stub.config(1)).unwrap());

    let slow = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.send_command(&Command::new(Action::Find)).await })
    };
    assert!(wait_for(|| client.pool().available() == 0).await);

    let reply = bounded(client.send_command(&Command::ping())).await.unwrap();
    assert_eq!(reply.into_value(), json!({}));

    bounded(slow).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_fallback_errors_reach_caller() {
    let stub = StubEngine::start(|_, command| match command["action"].as_str() {
        Some("find") => Reply::Delayed(Duration::from_millis(300), json!([])),
        _ => Reply::Raw(b"garbage".to_vec()),
    })
    .await;
    let client = Arc::new(EngineClient::new(stub.config(1)).unwrap());

    let slow = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.send_command(&Command::new(Action::Find)).await })
    };
    assert!(wait_for(|| client.pool().available() == 0).await);

    let err = bounded(client.send_command(&Command::ping())).await.unwrap_err();
    assert!(matches!(err, WireError::InvalidResponse(_)));

    bounded(slow).await.unwrap().unwrap();
}

// =============================================================================
// Timeout Tests
// =============================================================================

#[tokio::test]
async fn test_send_with_timeout_expires() {
    let stub = slow_find_stub().await;
    let config = ClientConfig {
        request_timeout_ms: 50,
        ..stub.config(1)
    };
    let client = EngineClient::new(config).unwrap();

    let err = bounded(client.send_with_timeout(&Command::new(Action::Find)))
        .await
        .unwrap_err();

    assert!(matches!(err, WireError::Timeout { ms: 50 }));
}

#[tokio::test]
async fn test_abandoned_request_keeps_slot_busy_until_reply() {
    let stub = slow_find_stub().await;
    let config = ClientConfig {
        request_timeout_ms: 50,
        ..stub.config(1)
    };
    let client = EngineClient::new(config).unwrap();

    let _ = bounded(client.send_with_timeout(&Command::new(Action::Find))).await;

    // Timeout abandons the caller's wait, not the exchange itself
    assert!(client.pool().connections()[0].is_busy());
    assert!(wait_for(|| !client.pool().connections()[0].is_busy()).await);
}

#[tokio::test]
async fn test_send_with_timeout_succeeds_when_fast() {
    let stub = StubEngine::echo().await;
    let client = EngineClient::new(stub.config(1)).unwrap();

    let reply = bounded(client.send_with_timeout(&Command::ping())).await.unwrap();

    assert_eq!(reply.documents().map(|d| d.len()), Some(1));
}
