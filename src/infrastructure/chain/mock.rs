//! In-memory chain used by unit tests

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

use crate::shared::errors::ChainError;
use super::types::{CommandResult, LocalRequest, LocalResponse, PactResult, SignedCommand};
use super::ChainClient;

type Handler = Box<dyn Fn(&LocalRequest) -> Result<LocalResponse, ChainError> + Send + Sync>;

/// Answers `local` through a closure and records every request
pub struct MockChain {
    handler: Handler,
    pub requests: Mutex<Vec<LocalRequest>>,
    pub sent: Mutex<Vec<SignedCommand>>,
}

impl MockChain {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&LocalRequest) -> Result<LocalResponse, ChainError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Every local call succeeds with `data`
    pub fn success(data: Value) -> Self {
        Self::new(move |_| Ok(ok(data.clone())))
    }

    /// Every local call fails with `message`
    pub fn failure(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_| Ok(failed(&message)))
    }

    pub fn codes(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.code.clone())
            .collect()
    }
}

pub fn ok(data: Value) -> LocalResponse {
    LocalResponse {
        result: PactResult::success(data),
    }
}

pub fn failed(message: &str) -> LocalResponse {
    LocalResponse {
        result: PactResult::failure(Some(message)),
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn local(&self, request: &LocalRequest) -> Result<LocalResponse, ChainError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(request)
    }

    async fn local_signed(&self, command: &SignedCommand) -> Result<LocalResponse, ChainError> {
        self.sent.lock().unwrap().push(command.clone());
        Ok(ok(Value::String("preview".to_string())))
    }

    async fn send(&self, command: &SignedCommand) -> Result<String, ChainError> {
        self.sent.lock().unwrap().push(command.clone());
        Ok(format!("req-{}", command.hash))
    }

    async fn listen(&self, request_key: &str) -> Result<CommandResult, ChainError> {
        Ok(CommandResult {
            req_key: request_key.to_string(),
            result: PactResult::success(Value::String("Write succeeded".to_string())),
            gas: Some(1200),
            tx_id: Some(1),
        })
    }
}
