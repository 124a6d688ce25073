//! MCP JSON-RPC integration tests.
//!
//! These tests spawn `social-clean --mcp` as a child process and communicate
//! via stdin/stdout using newline-delimited JSON-RPC (rmcp's stdio transport).

#![cfg(all(feature = "cli", feature = "mcp"))]

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

fn send_jsonrpc(stdin: &mut impl Write, msg: &Value) {
    let body = serde_json::to_string(msg).unwrap();
    writeln!(stdin, "{body}").unwrap();
    stdin.flush().unwrap();
}

fn read_jsonrpc_line(reader: &mut BufReader<impl std::io::Read>) -> Option<Value> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => None, // EOF
        Ok(_) => {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return read_jsonrpc_line(reader); // skip blank lines
            }
            serde_json::from_str(trimmed).ok()
        }
        Err(_) => None,
    }
}

/// Spawn the MCP server with the built-in registry, send requests, collect responses.
fn mcp_session(requests: Vec<Value>) -> Vec<Value> {
    let bin = env!("CARGO_BIN_EXE_social-clean");
    let mut child = Command::new(bin)
        .arg("--mcp")
        .env_remove("SOCIAL_CLEAN_REGISTRY")
        .env("XDG_DATA_HOME", std::env::temp_dir().join("social-clean-mcp-test-none"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to spawn {bin}: {e}"));

    let mut stdin = child.stdin.take().unwrap();
    let stdout = child.stdout.take().unwrap();
    let mut reader = BufReader::new(stdout);

    let mut responses = Vec::new();
    for req in &requests {
        send_jsonrpc(&mut stdin, req);
        // Only read a response for requests with an "id" (not notifications)
        if req.get("id").is_some() {
            if let Some(resp) = read_jsonrpc_line(&mut reader) {
                responses.push(resp);
            }
        }
    }

    drop(stdin);
    let _ = child.wait();
    responses
}

fn initialize() -> Vec<Value> {
    vec![
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "0.1.0"}
            }
        }),
        // Send initialized notification (no id)
        json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }),
    ]
}

fn call_tool(name: &str, arguments: Value) -> Value {
    let mut requests = initialize();
    requests.push(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    }));
    let responses = mcp_session(requests);
    responses.into_iter().find(|r| r["id"] == 2).unwrap()
}

fn tool_json(resp: &Value) -> Value {
    let content = &resp["result"]["content"][0];
    assert_eq!(content["type"], "text");
    serde_json::from_str(content["text"].as_str().unwrap()).unwrap()
}

#[test]
fn mcp_initialize_returns_server_info() {
    let responses = mcp_session(initialize());

    assert!(!responses.is_empty(), "No response received");
    let resp = &responses[0];
    assert_eq!(resp["jsonrpc"], "2.0");
    assert_eq!(resp["id"], 1);
    assert_eq!(resp["result"]["serverInfo"]["name"], "social-clean");
}

#[test]
fn mcp_tools_list_has_all_tools() {
    let mut requests = initialize();
    requests.push(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/list",
        "params": {}
    }));
    let responses = mcp_session(requests);

    let tools_resp = responses.iter().find(|r| r["id"] == 2).unwrap();
    let tools = tools_resp["result"]["tools"].as_array().unwrap();
    let tool_names: Vec<&str> = tools
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();

    let expected = [
        "clean_url",
        "clean_urls",
        "clean_records",
        "clean_text",
        "list_platforms",
    ];
    for name in &expected {
        assert!(
            tool_names.contains(name),
            "Missing tool: {name}. Found: {tool_names:?}"
        );
    }
    assert_eq!(tool_names.len(), expected.len());
}

#[test]
fn mcp_tools_call_clean_url() {
    let resp = call_tool(
        "clean_url",
        json!({"url": "https://youtube.com/watch?v=abc123&si=TRACK"}),
    );
    let parsed = tool_json(&resp);
    assert_eq!(parsed["clean_url"], "https://youtube.com/watch?v=abc123");
    assert_eq!(parsed["platform"], "YouTube");
}

#[test]
fn mcp_tools_call_clean_url_unsupported_is_error() {
    let resp = call_tool("clean_url", json!({"url": "https://example.com/?utm_source=x"}));
    assert!(resp.get("error").is_some(), "expected an error: {resp}");
    let message = resp["error"]["message"].as_str().unwrap();
    assert!(message.contains("Unsupported platform"));
}

#[test]
fn mcp_tools_call_clean_records() {
    let resp = call_tool(
        "clean_records",
        json!({"records": [{"link": "fb.watch/abc/?mibextid=1"}], "field": "link"}),
    );
    let parsed = tool_json(&resp);
    assert_eq!(parsed[0]["_clean_url"], "https://fb.watch/abc/");
    assert_eq!(parsed[0]["_platform"], "Facebook");
}

#[test]
fn mcp_tools_call_clean_text() {
    let resp = call_tool(
        "clean_text",
        json!({"text": "look https://www.tiktok.com/@a/video/1?is_from_webapp=1 wow"}),
    );
    let parsed = tool_json(&resp);
    assert_eq!(parsed["text"], "look https://www.tiktok.com/@a/video/1/ wow");
}

#[test]
fn mcp_tools_call_list_platforms() {
    let resp = call_tool("list_platforms", json!({}));
    let parsed = tool_json(&resp);
    assert_eq!(parsed.as_array().unwrap().len(), 6);
}
