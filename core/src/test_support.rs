//! Scripted transport for unit tests.

use std::collections::VecDeque;

use crate::http::{HttpRequest, RawResponse};
use crate::transport::{Transport, TransportOptions};

/// Answers requests from a fixed script and records what it was sent.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: VecDeque<RawResponse>,
    requests: Vec<HttpRequest>,
    options: Vec<TransportOptions>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<RawResponse>) -> Self {
        Self {
            responses: responses.into(),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> &[HttpRequest] {
        &self.requests
    }

    pub fn options(&self) -> &[TransportOptions] {
        &self.options
    }
}

impl Transport for ScriptedTransport {
    fn execute(&mut self, request: &HttpRequest, options: &TransportOptions) -> RawResponse {
        self.requests.push(request.clone());
        self.options.push(*options);
        self.responses
            .pop_front()
            .unwrap_or_else(|| RawResponse::transport_failure("script exhausted"))
    }
}
