//! In-memory transport that records every call.

#![allow(dead_code)]

use std::sync::Mutex;

use search_ads_core::api::transport::{CredentialContext, Transport, TransportError};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
    pub org_id: Option<String>,
    pub credentials: CredentialContext,
}

enum Reply {
    Body(Value),
    Status(u16, String),
}

struct Rule {
    method: &'static str,
    path_prefix: String,
    reply: Reply,
}

/// Replies from scripted rules (first matching prefix wins); anything
/// unscripted succeeds with a fresh id.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    rules: Mutex<Vec<Rule>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: &'static str, path_prefix: &str, body: Value) {
        self.rules.lock().unwrap().push(Rule {
            method,
            path_prefix: path_prefix.to_string(),
            reply: Reply::Body(body),
        });
    }

    pub fn fail(&self, method: &'static str, path_prefix: &str, status: u16, body: &str) {
        self.rules.lock().unwrap().push(Rule {
            method,
            path_prefix: path_prefix.to_string(),
            reply: Reply::Status(status, body.to_string()),
        });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| c.method == method).count()
    }

    /// `METHOD path` for every call, in order.
    pub fn log(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| format!("{} {}", c.method, c.path))
            .collect()
    }

    fn handle(
        &self,
        method: &'static str,
        credentials: &CredentialContext,
        path: &str,
        body: Option<&Value>,
        org_id: Option<&str>,
    ) -> Result<Value, TransportError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(RecordedCall {
            method,
            path: path.to_string(),
            body: body.cloned().unwrap_or(Value::Null),
            org_id: org_id.map(str::to_string),
            credentials: credentials.clone(),
        });
        let sequence = calls.len();
        drop(calls);

        let rules = self.rules.lock().unwrap();
        let rule = rules
            .iter()
            .find(|r| r.method == method && path.starts_with(&r.path_prefix));
        match rule.map(|r| &r.reply) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Status(status, body)) => Err(TransportError::Status {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(json!({"data": {"id": 1000 + sequence}, "error": null})),
        }
    }
}

impl Transport for RecordingTransport {
    fn get(
        &self,
        credentials: &CredentialContext,
        path: &str,
        org_id: Option<&str>,
    ) -> Result<Value, TransportError> {
        self.handle("GET", credentials, path, None, org_id)
    }

    fn put(
        &self,
        credentials: &CredentialContext,
        path: &str,
        body: &Value,
        org_id: Option<&str>,
    ) -> Result<Value, TransportError> {
        self.handle("PUT", credentials, path, Some(body), org_id)
    }

    fn post(
        &self,
        credentials: &CredentialContext,
        path: &str,
        body: &Value,
        org_id: Option<&str>,
    ) -> Result<Value, TransportError> {
        self.handle("POST", credentials, path, Some(body), org_id)
    }
}

/// A report response with one row holding the given buckets.
pub fn report_response(metadata: Value, buckets: Value) -> Value {
    json!({
        "data": {
            "reportingDataResponse": {
                "row": [{"metadata": metadata, "granularity": buckets}]
            }
        },
        "error": null
    })
}
