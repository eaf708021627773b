//! Protocol-level tests driving `McpServer::run` over an in-memory pipe
//!
//! The server reads requests from one end of a `tokio::io::duplex` pair and
//! writes responses to another, exactly as it would on stdin/stdout.

mod common;

use std::time::Duration;

use jenkins_mcp::format::VPN_HINT;
use jenkins_mcp::McpServer;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{dispatcher_for, UNREACHABLE_URL};

struct Session {
    input: DuplexStream,
    output: Lines<BufReader<DuplexStream>>,
    handle: JoinHandle<()>,
}

impl Session {
    fn start(jenkins_url: &str) -> Self {
        let (input, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, output) = tokio::io::duplex(64 * 1024);
        let server = McpServer::new(dispatcher_for(jenkins_url), "jenkins");
        let handle = tokio::spawn(async move {
            server
                .run(BufReader::new(server_in), server_out)
                .await
                .expect("server loop failed");
        });
        Self {
            input,
            output: BufReader::new(output).lines(),
            handle,
        }
    }

    async fn send(&mut self, message: Value) {
        let mut line = message.to_string();
        line.push('\n');
        self.input.write_all(line.as_bytes()).await.unwrap();
    }

    async fn send_raw(&mut self, raw: &str) {
        self.input.write_all(raw.as_bytes()).await.unwrap();
    }

    async fn recv(&mut self) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(10), self.output.next_line())
            .await
            .expect("timed out waiting for response")
            .unwrap()
            .expect("server closed output");
        serde_json::from_str(&line).unwrap()
    }

    async fn finish(self) {
        drop(self.input);
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop at EOF")
            .unwrap();
    }
}

#[tokio::test]
async fn test_handshake_and_listing() {
    let mut session = Session::start(UNREACHABLE_URL);

    session
        .send(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
                     "params": {"protocolVersion": "2025-03-26", "capabilities": {},
                                "clientInfo": {"name": "it", "version": "1.0"}}}))
        .await;
    let resp = session.recv().await;
    assert_eq!(resp["id"], 1);
    assert_eq!(resp["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(resp["result"]["serverInfo"]["name"], "jenkins");

    session
        .send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await;
    session
        .send(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
        .await;
    // The notification produced nothing, so the next frame answers id 2
    let resp = session.recv().await;
    assert_eq!(resp["id"], 2);
    let names: Vec<&str> = resp["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names.first(), Some(&"get_jobs"));
    assert_eq!(names.last(), Some(&"test_connection"));

    session
        .send(json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"}))
        .await;
    let resp = session.recv().await;
    assert_eq!(resp["result"]["resources"].as_array().unwrap().len(), 3);

    session.finish().await;
}

#[tokio::test]
async fn test_connectivity_failure_is_request_scoped() {
    let mut session = Session::start(UNREACHABLE_URL);

    session
        .send(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call",
                     "params": {"name": "test_connection", "arguments": {}}}))
        .await;
    let resp = session.recv().await;
    assert_eq!(resp["id"], 1);
    assert_eq!(resp["result"]["isError"], true);
    let text = resp["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains(VPN_HINT));

    session
        .send(json!({"jsonrpc": "2.0", "id": 2, "method": "ping"}))
        .await;
    let resp = session.recv().await;
    assert_eq!(resp["id"], 2);
    assert_eq!(resp["result"], json!({}));

    session.finish().await;
}

#[tokio::test]
async fn test_parse_error_then_recovery() {
    let mut session = Session::start(UNREACHABLE_URL);

    session.send_raw("{\"jsonrpc\": \"2.0\", \"id\": \n").await;
    let resp = session.recv().await;
    assert_eq!(resp["id"], Value::Null);
    assert_eq!(resp["error"]["code"], -32700);

    session
        .send(json!({"jsonrpc": "2.0", "id": 9, "method": "sampling/createMessage"}))
        .await;
    let resp = session.recv().await;
    assert_eq!(resp["id"], 9);
    assert_eq!(resp["error"]["code"], -32601);

    session.finish().await;
}

#[tokio::test]
async fn test_read_resource_round_trip() {
    let jenkins = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/queue/api/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": 1, "task": {"name": "api"}}]
        })))
        .expect(1)
        .mount(&jenkins)
        .await;

    let mut session = Session::start(&jenkins.uri());
    session
        .send(json!({"jsonrpc": "2.0", "id": "q", "method": "resources/read",
                     "params": {"uri": "jenkins://queue"}}))
        .await;
    let resp = session.recv().await;
    let contents = &resp["result"]["contents"][0];
    assert_eq!(contents["uri"], "jenkins://queue");
    assert_eq!(contents["mimeType"], "application/json");
    let items: Vec<Value> = serde_json::from_str(contents["text"].as_str().unwrap()).unwrap();
    assert_eq!(items[0]["task"]["name"], "api");

    session.finish().await;
}
