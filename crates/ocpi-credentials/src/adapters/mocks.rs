//! Scripted transport for tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use ocpi_types::{
    HttpMethod, HttpRequest, HttpResponse, OcpiResponseBody, OcpiStatus, SystemClock,
};
use parking_lot::Mutex;
use serde::Serialize;

use crate::ports::{TransportClient, TransportError};

#[derive(Debug, Default)]
struct Script {
    responses: HashMap<(HttpMethod, String), VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Vec<HttpRequest>,
}

/// Answers requests from a per-(method, url) queue and records every request.
///
/// The last queued answer for a route is replayed once the queue is down to
/// one entry. Unscripted routes fail with `TransportError::Connect`.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<Script>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response.
    pub fn respond(&self, method: HttpMethod, url: &str, response: HttpResponse) {
        self.push(method, url, Ok(response));
    }

    /// Queue a 200 success envelope carrying `data`.
    pub fn respond_ok<T: Serialize>(&self, method: HttpMethod, url: &str, data: T) {
        let envelope = OcpiResponseBody::success(data, &SystemClock);
        self.push(method, url, Ok(envelope_response(200, &envelope)));
    }

    /// Queue a failure envelope with `status`.
    pub fn respond_status(&self, method: HttpMethod, url: &str, http_status: u16, status: OcpiStatus) {
        let envelope: OcpiResponseBody<()> = OcpiResponseBody::failure(status, None, &SystemClock);
        self.push(method, url, Ok(envelope_response(http_status, &envelope)));
    }

    /// Queue a transport failure.
    pub fn fail(&self, method: HttpMethod, url: &str, error: TransportError) {
        self.push(method, url, Err(error));
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.lock().requests.clone()
    }

    /// Requests sent to `url` with `method`.
    pub fn requests_to(&self, method: HttpMethod, url: &str) -> Vec<HttpRequest> {
        self.script
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .cloned()
            .collect()
    }

    fn push(&self, method: HttpMethod, url: &str, answer: Result<HttpResponse, TransportError>) {
        self.script
            .lock()
            .responses
            .entry((method, url.to_string()))
            .or_default()
            .push_back(answer);
    }
}

fn envelope_response<T: Serialize>(status: u16, envelope: &OcpiResponseBody<T>) -> HttpResponse {
    HttpResponse::from_envelope(status, envelope)
        .unwrap_or_else(|e| HttpResponse::new(500, e.to_string()))
}

#[async_trait]
impl TransportClient for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut script = self.script.lock();
        let key = (request.method, request.url.clone());
        script.requests.push(request);
        let queue = script
            .responses
            .get_mut(&key)
            .ok_or_else(|| TransportError::Connect(format!("no route to {} {}", key.0, key.1)))?;
        match queue.len() {
            0 => Err(TransportError::Connect(format!("no route to {} {}", key.0, key.1))),
            1 => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TransportError::Other("empty script".to_string()))),
            _ => queue
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("empty script".to_string()))),
        }
    }
}
