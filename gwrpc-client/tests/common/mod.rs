//! Common test utilities for gwrpc-client integration tests
//!
//! `MockNode` is a small WebSocket server that records every request it
//! receives and lets each test decide, per connection, what to do with it.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// What the node does with one request
pub enum Action {
    /// Answer with a text frame
    Reply(String),
    /// Answer with a binary frame
    ReplyBinary(String),
    /// Answer with a text frame after a pause
    Delayed(Duration, String),
    /// Drop the TCP connection without a closing handshake
    Drop,
    /// Send a close frame and end the connection
    Close,
    /// Never answer
    Ignore,
}

type Handler = dyn Fn(usize, &Value) -> Action + Send + Sync;

/// Mock Graphene node
pub struct MockNode {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Value>>>,
    connections: Arc<AtomicUsize>,
    shutdown_tx: watch::Sender<bool>,
}

impl MockNode {
    /// Node that answers like a small chain (see `graphene_handler`)
    pub async fn graphene() -> Self {
        Self::with_handler(|_, request| graphene_handler(request)).await
    }

    /// Node driven by `handler(connection_index, request)`
    ///
    /// Connections are numbered from 0 in accept order.
    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(usize, &Value) -> Action + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handler: Arc<Handler> = Arc::new(handler);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let accept_requests = requests.clone();
        let accept_connections = connections.clone();
        let connection_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let index = accept_connections.fetch_add(1, Ordering::SeqCst);
                        tokio::spawn(serve_connection(
                            stream,
                            index,
                            handler.clone(),
                            accept_requests.clone(),
                            connection_shutdown.clone(),
                        ));
                    }
                }
            }
        });

        Self {
            addr,
            requests,
            connections,
            shutdown_tx,
        }
    }

    /// WebSocket URL of this node
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Every request received so far, across all connections
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests addressed to the login API
    pub fn login_requests(&self) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|request| api_of(request) == 1)
            .collect()
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Stop accepting and drop every open connection
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    index: usize,
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<Value>>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };

    loop {
        let frame = tokio::select! {
            _ = shutdown_rx.changed() => return,
            frame = ws.next() => frame,
        };
        let text = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(_)) => continue,
            _ => return,
        };
        let request: Value = serde_json::from_str(&text).unwrap();
        requests.lock().unwrap().push(request.clone());

        match handler(index, &request) {
            Action::Reply(reply) => {
                let _ = ws.send(Message::Text(reply)).await;
            }
            Action::ReplyBinary(reply) => {
                let _ = ws.send(Message::Binary(reply.into_bytes())).await;
            }
            Action::Delayed(delay, reply) => {
                tokio::time::sleep(delay).await;
                let _ = ws.send(Message::Text(reply)).await;
            }
            Action::Drop => return,
            Action::Close => {
                let _ = ws.close(None).await;
                return;
            }
            Action::Ignore => {}
        }
    }
}

/// Objects the mock chain knows about
pub fn chain_object(id: &str) -> Option<Value> {
    match id {
        "1.2.0" => Some(json!({"id": "1.2.0", "name": "committee-account"})),
        "1.2.121" => Some(json!({"id": "1.2.121", "name": "init0"})),
        "1.3.0" => Some(json!({"id": "1.3.0", "symbol": "CORE", "precision": 5})),
        _ => None,
    }
}

pub fn global_properties() -> Value {
    json!({
        "id": "2.0.0",
        "parameters": {"block_interval": 3, "maximum_transaction_size": 2048},
        "active_committee_members": ["1.5.0", "1.5.1"]
    })
}

/// Answers of the mock chain
///
/// `database` serves `get_objects` and `get_global_properties`; `login`
/// enables `history` (3) and `network_broadcast` (2) and refuses the rest.
pub fn graphene_handler(request: &Value) -> Action {
    let id = &request["id"];
    let method = method_of(request);
    let args = &request["params"][2];

    let reply = match (api_of(request), method) {
        (0, "get_objects") => {
            let objects: Vec<Value> = args[0]
                .as_array()
                .unwrap()
                .iter()
                .map(|id| chain_object(id.as_str().unwrap()).unwrap_or(Value::Null))
                .collect();
            result_reply(id, json!(objects))
        }
        (0, "get_global_properties") => result_reply(id, global_properties()),
        (1, "history") => result_reply(id, json!(3)),
        (1, "network_broadcast") => result_reply(id, json!(2)),
        (1, name) => error_reply(id, &format!("API {} not enabled", name), None),
        (3, "get_account_history") => result_reply(id, json!([])),
        (_, name) => error_reply(
            id,
            "Assert Exception",
            Some(&format!("method {} does not exist", name)),
        ),
    };
    Action::Reply(reply)
}

pub fn api_of(request: &Value) -> u64 {
    request["params"][0].as_u64().unwrap()
}

pub fn method_of(request: &Value) -> &str {
    request["params"][1].as_str().unwrap()
}

pub fn result_reply(id: &Value, result: Value) -> String {
    json!({"id": id, "jsonrpc": "2.0", "result": result}).to_string()
}

pub fn error_reply(id: &Value, message: &str, detail: Option<&str>) -> String {
    let mut error = json!({"code": 1, "message": message});
    if let Some(detail) = detail {
        error["detail"] = json!(detail);
    }
    json!({"id": id, "jsonrpc": "2.0", "error": error}).to_string()
}
