//! End-to-end tests over a real TCP connection

use chisel_foundation::config::ServerConfig;
use chisel_foundation::AppConfig;
use chisel_server::{create_dispatcher, LifecycleState, ServerLifecycle};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0, // let the OS pick
        ..ServerConfig::default()
    }
}

fn lifecycle() -> ServerLifecycle {
    let config = AppConfig::default();
    ServerLifecycle::new(create_dispatcher(&config), test_config())
}

async fn call(addr: SocketAddr, request: Value) -> Value {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let line = serde_json::to_string(&request).unwrap();
    writer.write_all(line.as_bytes()).await.unwrap();
    writer.write_all(b"\n").await.unwrap();
    writer.flush().await.unwrap();

    let mut response = String::new();
    reader.read_line(&mut response).await.unwrap();
    serde_json::from_str(&response).unwrap()
}

fn tool_call(name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
}

#[tokio::test]
async fn starts_and_stops() {
    let server = lifecycle();
    assert_eq!(server.state().await, LifecycleState::Stopped);

    let addr = server.start().await.unwrap();
    assert!(server.is_running().await);
    assert_eq!(server.local_addr().await, Some(addr));

    server.stop().await;
    assert_eq!(server.state().await, LifecycleState::Stopped);
    assert!(server.local_addr().await.is_none());
}

#[tokio::test]
async fn double_start_keeps_one_endpoint() {
    let server = lifecycle();
    let first = server.start().await.unwrap();
    let second = server.start().await.unwrap();
    assert_eq!(first, second);
    server.stop().await;
}

#[tokio::test]
async fn stop_when_not_running_is_a_noop() {
    let server = lifecycle();
    server.stop().await;
    assert_eq!(server.state().await, LifecycleState::Stopped);
}

#[tokio::test]
async fn stop_disconnects_connected_clients() {
    let config = AppConfig::default();
    let server = ServerLifecycle::new(
        create_dispatcher(&config),
        ServerConfig {
            port: 0,
            shutdown_grace_secs: 1,
            ..ServerConfig::default()
        },
    );
    let addr = server.start().await.unwrap();

    let stream = TcpStream::connect(addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let request =
        serde_json::to_string(&json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }))
            .unwrap();

    // one live round-trip before the stop
    writer.write_all(request.as_bytes()).await.unwrap();
    writer.write_all(b"\n").await.unwrap();
    writer.flush().await.unwrap();
    let mut response = String::new();
    reader.read_line(&mut response).await.unwrap();
    assert!(response.contains("tools"));

    server.stop().await;
    assert_eq!(server.state().await, LifecycleState::Stopped);

    // once Stopped, the old connection is closed: writes may land in the
    // kernel buffer but the next read hits EOF instead of a response
    let _ = writer.write_all(request.as_bytes()).await;
    let _ = writer.write_all(b"\n").await;
    let _ = writer.flush().await;
    let mut after = String::new();
    let n = reader.read_line(&mut after).await.unwrap_or(0);
    assert_eq!(n, 0, "server answered after stop: {}", after);
}

#[tokio::test]
async fn bind_failure_leaves_server_stopped() {
    let server = lifecycle();
    let addr = server.start().await.unwrap();

    // second lifecycle on the exact same port must fail to bind
    let config = AppConfig::default();
    let contender = ServerLifecycle::new(
        create_dispatcher(&config),
        ServerConfig {
            port: addr.port(),
            ..ServerConfig::default()
        },
    );
    let err = contender.start().await.unwrap_err();
    assert!(chisel_server::lifecycle::is_bind_failure(&err));
    assert!(!contender.is_running().await);
    assert_eq!(contender.state().await, LifecycleState::Stopped);

    server.stop().await;
}

#[tokio::test]
async fn initialize_and_tools_list_over_tcp() {
    let server = lifecycle();
    let addr = server.start().await.unwrap();

    let response = call(
        addr,
        json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }),
    )
    .await;
    assert_eq!(
        response["result"]["protocolVersion"],
        chisel_foundation::protocol::PROTOCOL_VERSION
    );

    let response = call(
        addr,
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
    )
    .await;
    let tools = response["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 7);

    server.stop().await;
}

#[tokio::test]
async fn find_usages_of_unreferenced_class_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("c.src");
    std::fs::write(&file, "class C {}").unwrap();

    let server = lifecycle();
    let addr = server.start().await.unwrap();

    let response = call(
        addr,
        tool_call(
            "find_usages",
            json!({
                "filePath": file.to_str().unwrap(),
                "codeToSymbol": "class "
            }),
        ),
    )
    .await;
    assert_eq!(response["result"], json!({ "usages": [] }));

    server.stop().await;
}

#[tokio::test]
async fn rename_element_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("c.src");
    std::fs::write(&file, "class C {}").unwrap();

    let server = lifecycle();
    let addr = server.start().await.unwrap();

    let response = call(
        addr,
        tool_call(
            "rename_element",
            json!({
                "filePath": file.to_str().unwrap(),
                "codeToSymbol": "class ",
                "newName": "D"
            }),
        ),
    )
    .await;
    assert_eq!(response["result"]["status"], "success");
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "class D {}");

    server.stop().await;
}

#[tokio::test]
async fn tool_failure_arrives_as_error_envelope() {
    let server = lifecycle();
    let addr = server.start().await.unwrap();

    let response = call(
        addr,
        tool_call(
            "delete_file",
            json!({ "targetFilePath": "/nonexistent/ghost.src" }),
        ),
    )
    .await;
    assert!(response["error"].is_null());
    assert_eq!(response["result"]["status"], "error");
    assert!(response["result"]["message"].is_string());

    server.stop().await;
}

#[tokio::test]
async fn malformed_json_gets_a_parse_error() {
    let server = lifecycle();
    let addr = server.start().await.unwrap();

    let stream = TcpStream::connect(addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    writer.write_all(b"this is not json\n").await.unwrap();
    writer.flush().await.unwrap();

    let mut response = String::new();
    reader.read_line(&mut response).await.unwrap();
    let response: Value = serde_json::from_str(&response).unwrap();
    assert_eq!(response["error"]["code"], -32700);

    server.stop().await;
}

#[tokio::test]
async fn two_lifecycles_run_side_by_side() {
    let config = AppConfig::default();
    let a = ServerLifecycle::new(create_dispatcher(&config), test_config());
    let b = ServerLifecycle::new(create_dispatcher(&config), test_config());

    let addr_a = a.start().await.unwrap();
    let addr_b = b.start().await.unwrap();
    assert_ne!(addr_a, addr_b);

    a.stop().await;
    // stopping one does not affect the other
    assert!(b.is_running().await);
    let response = call(
        addr_b,
        json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }),
    )
    .await;
    assert!(response["result"]["tools"].is_array());

    b.stop().await;
}
