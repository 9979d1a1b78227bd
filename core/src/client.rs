//! Client façade for the SW-Retail REST service.
//!
//! # Design
//! `SwRetailClient` owns its configuration, one transport and a shared log
//! sink. Every call goes the same way: clear the last error, derive the
//! request plan, build the `HttpRequest`, execute it, classify the response
//! and keep the resulting `ErrorRecord`. There is one attempt per call and no
//! retry.
//!
//! Calls take `&mut self`: an instance serves one caller at a time. Use one
//! client per thread for concurrent work.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::classify::{classify, Classified};
use crate::config::ClientConfig;
use crate::dispatch::{CallDescriptor, RequestPlan};
use crate::error::{ConfigError, DispatchError};
use crate::http::{HttpMethod, HttpRequest, ResponseMeta};
use crate::log::{LogSink, Severity, TracingSink};
use crate::transport::{default_headers, Transport, TransportOptions, UreqTransport};
use crate::types::{ErrorRecord, Outcome};

pub struct SwRetailClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
    log: Arc<dyn LogSink>,
    last_error: Option<ErrorRecord>,
    last_response: Option<ResponseMeta>,
}

impl SwRetailClient<UreqTransport> {
    /// Client for cloud instance `instance`, logging through `tracing`.
    pub fn new(instance: &str, api_key: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_config(ClientConfig::new(instance, api_key)?))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_log(config, Arc::new(TracingSink))
    }

    pub fn with_log(config: ClientConfig, log: Arc<dyn LogSink>) -> Self {
        let transport = UreqTransport::new(&TransportOptions::from_config(&config));
        Self::with_transport(config, transport, log)
    }
}

impl<T: Transport> SwRetailClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T, log: Arc<dyn LogSink>) -> Self {
        Self {
            config,
            transport,
            log,
            last_error: None,
            last_response: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Log request and response details from the next call on.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.config.verbose = verbose;
    }

    /// Turn TLS certificate and host verification on or off from the next
    /// call on.
    pub fn set_verify_peer(&mut self, verify_peer: bool) {
        self.config.verify_peer = verify_peer;
    }

    /// Disable TLS verification, for hosts that lack the service's CA in
    /// their trust store. This exposes calls to man-in-the-middle attacks.
    pub fn unsafe_mode(&mut self) {
        self.log.log(
            Severity::Info,
            "TLS peer verification disabled for subsequent requests",
        );
        self.set_verify_peer(false);
    }

    /// Failure recorded by the most recent call, if any.
    pub fn last_error(&self) -> Option<&ErrorRecord> {
        self.last_error.as_ref()
    }

    /// Status and headers of the most recent HTTP response.
    pub fn last_response(&self) -> Option<&ResponseMeta> {
        self.last_response.as_ref()
    }

    /// Call an endpoint by symbolic name: `getArticle`, `postArticle_Image`,
    /// `deleteArticle`, ...
    ///
    /// Fails only when the call itself is malformed; such misuse is logged as
    /// critical and no request is sent.
    pub fn invoke(&mut self, name: &str, args: Vec<Value>) -> Result<Outcome, DispatchError> {
        self.clear_last();
        let plan = CallDescriptor::parse(name, args).and_then(|call| call.plan());
        self.run(plan)
    }

    /// Call an explicitly described endpoint.
    pub fn call(&mut self, call: &CallDescriptor) -> Result<Outcome, DispatchError> {
        self.clear_last();
        self.run(call.plan())
    }

    pub fn get(&mut self, endpoint: &str, args: Vec<Value>) -> Result<Outcome, DispatchError> {
        self.call(&CallDescriptor::new(HttpMethod::Get, endpoint, args))
    }

    pub fn delete(&mut self, endpoint: &str, args: Vec<Value>) -> Result<Outcome, DispatchError> {
        self.call(&CallDescriptor::new(HttpMethod::Delete, endpoint, args))
    }

    pub fn post(&mut self, endpoint: &str, body: Map<String, Value>) -> Result<Outcome, DispatchError> {
        self.call(&CallDescriptor::new(
            HttpMethod::Post,
            endpoint,
            vec![Value::Object(body)],
        ))
    }

    pub fn put(&mut self, endpoint: &str, body: Map<String, Value>) -> Result<Outcome, DispatchError> {
        self.call(&CallDescriptor::new(
            HttpMethod::Put,
            endpoint,
            vec![Value::Object(body)],
        ))
    }

    fn clear_last(&mut self) {
        self.last_error = None;
        self.last_response = None;
    }

    fn run(&mut self, plan: Result<RequestPlan, DispatchError>) -> Result<Outcome, DispatchError> {
        match plan {
            Ok(plan) => Ok(self.execute(&plan)),
            Err(err) => {
                self.log.log(Severity::Critical, &err.to_string());
                Err(err)
            }
        }
    }

    fn execute(&mut self, plan: &RequestPlan) -> Outcome {
        let span = tracing::debug_span!("swretail.call", method = %plan.method, path = %plan.path);
        let _entered = span.enter();

        let request = self.build_request(plan);
        let options = TransportOptions::from_config(&self.config);
        let raw = self.transport.execute(&request, &options);

        if !raw.is_transport_failure() {
            self.last_response = Some(ResponseMeta {
                status: raw.status,
                headers: raw.headers.clone(),
            });
        }

        let Classified { outcome, error } = classify(&raw, self.log.as_ref());
        tracing::debug!(status = raw.status, success = outcome.is_success(), "call finished");
        self.last_error = error;
        outcome
    }

    /// The request a plan turns into: base URL plus path, the fixed headers
    /// and the JSON-encoded body.
    pub fn build_request(&self, plan: &RequestPlan) -> HttpRequest {
        HttpRequest {
            method: plan.method,
            url: self.config.url_for(&plan.path),
            headers: default_headers(self.config.api_key()),
            body: plan
                .body
                .as_ref()
                .map(|body| Value::Object(body.clone()).to_string()),
        }
    }
}
