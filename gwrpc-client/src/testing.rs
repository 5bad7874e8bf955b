//! Scripted transport for unit tests
//!
//! A `Script` is a queue of steps shared by every connection its connector
//! opens, so a test can describe what happens across reconnects in one list.

use crate::transport::{Connector, Transport};
use async_trait::async_trait;
use gwrpc_core::{Error, Result};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// What the next `send`/`receive` on any scripted connection does
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Reply with this result, echoing the id of the last request sent
    Result(Value),
    /// Reply with an error member
    Error {
        message: &'static str,
        detail: Option<&'static str>,
    },
    /// Reply with this exact payload
    Raw(&'static str),
    /// `receive` fails with `ConnectionClosed`
    Closed,
    /// `receive` fails with `Transport`
    Fault(&'static str),
    /// `receive` never completes
    Stall,
    /// `send` fails with `ConnectionClosed`
    SendClosed,
}

#[derive(Default)]
struct ScriptState {
    steps: VecDeque<Step>,
    sent: Vec<Value>,
    connects: usize,
    closes: usize,
    refuse_connects: usize,
    stall_connects: usize,
}

#[derive(Clone, Default)]
pub(crate) struct Script {
    state: Arc<Mutex<ScriptState>>,
}

impl Script {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn then(self, step: Step) -> Self {
        self.push(step);
        self
    }

    pub(crate) fn push(&self, step: Step) {
        self.state.lock().unwrap().steps.push_back(step);
    }

    pub(crate) fn refuse_connects(self, count: usize) -> Self {
        self.refuse_next_connects(count);
        self
    }

    /// Refuse the next `count` connects of an already running script
    pub(crate) fn refuse_next_connects(&self, count: usize) {
        self.state.lock().unwrap().refuse_connects = count;
    }

    pub(crate) fn stall_connects(self, count: usize) -> Self {
        self.state.lock().unwrap().stall_connects = count;
        self
    }

    pub(crate) fn connector(&self) -> ScriptedConnector {
        ScriptedConnector {
            state: self.state.clone(),
        }
    }

    /// Every request sent so far, parsed back into JSON
    pub(crate) fn sent(&self) -> Vec<Value> {
        self.state.lock().unwrap().sent.clone()
    }

    pub(crate) fn sent_ids(&self) -> Vec<u64> {
        self.sent()
            .iter()
            .map(|request| request["id"].as_u64().unwrap())
            .collect()
    }

    /// Connect attempts, refused ones included
    pub(crate) fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub(crate) fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub(crate) fn remaining(&self) -> usize {
        self.state.lock().unwrap().steps.len()
    }
}

pub(crate) struct ScriptedConnector {
    state: Arc<Mutex<ScriptState>>,
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>> {
        let stall = {
            let mut state = self.state.lock().unwrap();
            state.connects += 1;
            if state.refuse_connects > 0 {
                state.refuse_connects -= 1;
                return Err(Error::Connection {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            if state.stall_connects > 0 {
                state.stall_connects -= 1;
                true
            } else {
                false
            }
        };
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(Box::new(ScriptedTransport {
            state: self.state.clone(),
            closed: false,
        }))
    }
}

struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
    closed: bool,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, payload: String) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if matches!(state.steps.front(), Some(Step::SendClosed)) {
            state.steps.pop_front();
            return Err(Error::ConnectionClosed);
        }
        let request: Value = serde_json::from_str(&payload).expect("client sent invalid JSON");
        state.sent.push(request);
        Ok(())
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        let (step, last_id) = {
            let mut state = self.state.lock().unwrap();
            let last_id = state.sent.last().map(|r| r["id"].clone()).unwrap_or(Value::Null);
            (state.steps.pop_front(), last_id)
        };
        match step {
            Some(Step::Result(result)) => {
                Ok(json!({"id": last_id, "result": result}).to_string().into_bytes())
            }
            Some(Step::Error { message, detail }) => {
                let mut error = json!({"code": 1, "message": message});
                if let Some(detail) = detail {
                    error["detail"] = json!(detail);
                }
                Ok(json!({"id": last_id, "error": error}).to_string().into_bytes())
            }
            Some(Step::Raw(payload)) => Ok(payload.as_bytes().to_vec()),
            Some(Step::Closed) => Err(Error::ConnectionClosed),
            Some(Step::Fault(message)) => Err(Error::Transport(message.to_string())),
            Some(Step::Stall) => std::future::pending().await,
            Some(Step::SendClosed) => panic!("SendClosed scripted where a reply was expected"),
            None => Err(Error::Transport("script exhausted".to_string())),
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.lock().unwrap().closes += 1;
        }
    }
}
