//! Codec Tests
//!
//! Stream helpers over in-memory duplex pipes.

use dbwire::protocol::{encode_command, read_reply, round_trip, write_command};
use dbwire::{Command, Response};
use serde_json::{json, Map, Value};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn test_write_command_sends_plain_json() {
    let (mut client, mut server) = duplex(1024);
    let payload = encode_command(&Command::ping()).unwrap();

    write_command(&mut client, &payload).await.unwrap();
    drop(client);

    let mut received = Vec::new();
    server.read_to_end(&mut received).await.unwrap();
    assert_eq!(received, br#"{"action":"ping"}"#);
}

#[tokio::test]
async fn test_read_reply_collects_until_eof() {
    let (mut client, mut server) = duplex(8);

    let writer = tokio::spawn(async move {
        // Several small writes, larger than the pipe buffer in total
        let chunks: [&[u8]; 3] = [b"[{\"id\"", b":\"1\"},", b"{\"id\":\"2\"}]"];
        for chunk in chunks {
            server.write_all(chunk).await.unwrap();
        }
        server.shutdown().await.unwrap();
    });

    let reply = read_reply(&mut client).await.unwrap();
    writer.await.unwrap();

    let value: Value = serde_json::from_slice(&reply).unwrap();
    assert_eq!(value, json!([{"id": "1"}, {"id": "2"}]));
}

#[tokio::test]
async fn test_read_reply_empty_stream_is_empty_buffer() {
    let (mut client, server) = duplex(64);
    drop(server);

    let reply = read_reply(&mut client).await.unwrap();
    assert!(reply.is_empty());
}

#[tokio::test]
async fn test_round_trip_empty_reply_is_empty_object() {
    let (mut client, mut server) = duplex(1024);

    let engine = tokio::spawn(async move {
        // Read the command, then close without answering
        let mut buf = [0u8; 128];
        let n = server.read(&mut buf).await.unwrap();
        assert!(n > 0);
        server.shutdown().await.unwrap();
    });

    let payload = encode_command(&Command::ping()).unwrap();
    let reply = round_trip(&mut client, &payload).await.unwrap();
    engine.await.unwrap();

    assert_eq!(reply, Response::Object(Map::new()));
}

#[tokio::test]
async fn test_round_trip_normalizes() {
    let (mut client, mut server) = duplex(1024);

    let engine = tokio::spawn(async move {
        let mut buf = [0u8; 128];
        let n = server.read(&mut buf).await.unwrap();
        let request: Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(request["action"], json!("ping"));

        server
            .write_all(br#"{"status":"ok","data":[{"pong":true}]}"#)
            .await
            .unwrap();
        server.shutdown().await.unwrap();
    });

    let payload = encode_command(&Command::ping()).unwrap();
    let reply = round_trip(&mut client, &payload).await.unwrap();
    engine.await.unwrap();

    assert_eq!(reply, Response::Documents(vec![json!({"pong": true})]));
}
