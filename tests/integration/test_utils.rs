use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use serde_json::Value;

use cert_manager::{Client, Request, Response, Transport};

pub const BASE_URL: &str = "https://cert-manager.example/api";

/// Serves canned responses in order and keeps every request it was sent.
#[derive(Default)]
pub struct FakeServer {
    responses: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Request>>,
}

impl FakeServer {
    pub fn start() -> Arc<Self> {
        let _ = env_logger::builder().is_test(true).try_init();
        Arc::new(Self::default())
    }

    pub fn client(self: &Arc<Self>) -> Client {
        Client::with_transport(BASE_URL, self.clone())
    }

    pub fn reply(&self, response: Response) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn reply_json(&self, status: u16, body: Value) {
        self.reply(Response::new(status).with_json(body));
    }

    pub fn reply_created(&self, location: &str) {
        self.reply(Response::new(201).with_header("Location", location));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Result<Request> {
        self.requests()
            .pop()
            .ok_or_else(|| anyhow!("no request reached the server"))
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|request| request.url).collect()
    }
}

impl Transport for FakeServer {
    fn send(&self, request: Request) -> cert_manager::Result<Response> {
        let response = self.responses.lock().unwrap().pop_front();
        let response = match response {
            Some(response) => response,
            None => panic!("no response scripted for {}", request.url),
        };
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

pub fn url(path: &str) -> String {
    format!("{BASE_URL}{path}")
}

pub fn query<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}
