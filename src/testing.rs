use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::Result;
use crate::transport::{Method, Request, Response, Transport};

pub(crate) const BASE_URL: &str = "https://cert-manager.example/api";

/// Replays queued responses in order and records every request it receives.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub(crate) fn push(&self, response: Response) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_json(&self, status: u16, body: Value) {
        self.push(Response::new(status).with_json(body));
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> Request {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    pub(crate) fn count(&self, method: Method) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.method == method)
            .count()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: Request) -> Result<Response> {
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                panic!(
                    "unexpected {} {}: no scripted response left",
                    request.method.as_str(),
                    request.url
                )
            });
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

/// Reads a query parameter from a recorded request.
pub(crate) fn param<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}
