//! Transport: executes one `HttpRequest` and reports what came back.
//!
//! # Design
//! `Transport` is the only seam that touches the network. The client passes
//! fresh `TransportOptions` with every request, so nothing configured for one
//! call leaks into the next. `UreqTransport` keeps one `ureq::Agent` for the
//! life of the client and rebuilds it only when the options it was built
//! with no longer match.
//!
//! A transport never returns an error: every failure becomes a
//! `RawResponse::transport_failure` carrying the underlying error text.

use std::time::Duration;

use ureq::tls::TlsConfig;
use ureq::Agent;

use crate::config::{ClientConfig, CONNECT_TIMEOUT, TOTAL_TIMEOUT};
use crate::http::{HttpMethod, HttpRequest, RawResponse};

/// Name of the header carrying the API key.
pub const AUTH_HEADER: &str = "X-Auth";

/// Largest response body read. Large listings must not turn into transport
/// failures, so the body is read without a cap.
pub const MAX_BODY_SIZE: u64 = u64::MAX;

/// Per-request transport settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    /// Verify the TLS certificate chain and host name.
    pub verify_peer: bool,
    /// Log every request and response in detail.
    pub verbose: bool,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
}

impl TransportOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            verify_peer: config.verify_peer,
            verbose: config.verbose,
            connect_timeout: CONNECT_TIMEOUT,
            total_timeout: TOTAL_TIMEOUT,
        }
    }
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            verify_peer: true,
            verbose: false,
            connect_timeout: CONNECT_TIMEOUT,
            total_timeout: TOTAL_TIMEOUT,
        }
    }
}

/// Executes HTTP requests. One instance serves one client; it is not shared
/// between threads.
pub trait Transport {
    fn execute(&mut self, request: &HttpRequest, options: &TransportOptions) -> RawResponse;
}

/// Fixed headers of every request: the API key and the JSON content type.
pub fn default_headers(api_key: &str) -> Vec<(String, String)> {
    vec![
        (AUTH_HEADER.to_string(), api_key.to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ]
}

/// Agent-level part of `TransportOptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSettings {
    pub verify_peer: bool,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
}

impl From<&TransportOptions> for AgentSettings {
    fn from(options: &TransportOptions) -> Self {
        Self {
            verify_peer: options.verify_peer,
            connect_timeout: options.connect_timeout,
            total_timeout: options.total_timeout,
        }
    }
}

/// HTTPS transport backed by a blocking `ureq` agent.
pub struct UreqTransport {
    agent: Agent,
    settings: AgentSettings,
}

impl UreqTransport {
    pub fn new(options: &TransportOptions) -> Self {
        let settings = AgentSettings::from(options);
        Self {
            agent: build_agent(&settings),
            settings,
        }
    }

    /// Settings the current agent was built with.
    pub fn settings(&self) -> AgentSettings {
        self.settings
    }

    fn reset(&mut self, options: &TransportOptions) {
        let wanted = AgentSettings::from(options);
        if wanted != self.settings {
            tracing::debug!(
                verify_peer = wanted.verify_peer,
                "transport settings changed, rebuilding agent"
            );
            self.agent = build_agent(&wanted);
            self.settings = wanted;
        }
    }

    fn send(&self, request: &HttpRequest) -> Result<RawResponse, ureq::Error> {
        let headers = request.headers.as_slice();
        let body = request.body.as_deref().unwrap_or("");
        let response = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(&request.url), headers).call()?,
            HttpMethod::Delete => with_headers(self.agent.delete(&request.url), headers).call()?,
            HttpMethod::Post => {
                with_headers(self.agent.post(&request.url), headers).send(body.as_bytes())?
            }
            HttpMethod::Put => {
                with_headers(self.agent.put(&request.url), headers).send(body.as_bytes())?
            }
        };
        read_response(response)
    }
}

/// Status, headers and the full body of a ureq response.
pub fn read_response(
    mut response: ureq::http::Response<ureq::Body>,
) -> Result<RawResponse, ureq::Error> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response
        .body_mut()
        .with_config()
        .limit(MAX_BODY_SIZE)
        .read_to_string()?;
    Ok(RawResponse::new(status, headers, body))
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&TransportOptions::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&mut self, request: &HttpRequest, options: &TransportOptions) -> RawResponse {
        self.reset(options);

        if !is_https(&request.url) {
            return RawResponse::transport_failure(format!(
                "refusing non-HTTPS URL {}: only https is allowed",
                request.url
            ));
        }

        if options.verbose {
            tracing::info!(
                method = %request.method,
                url = %request.url,
                headers = ?masked_headers(&request.headers),
                body_len = request.body.as_ref().map_or(0, String::len),
                verify_peer = options.verify_peer,
                "sending request"
            );
        }

        match self.send(request) {
            Ok(raw) => {
                if options.verbose {
                    tracing::info!(
                        status = raw.status,
                        headers = ?raw.headers,
                        body_len = raw.body.len(),
                        "received response"
                    );
                }
                raw
            }
            Err(err) => {
                if options.verbose {
                    tracing::info!(error = %err, "request failed");
                }
                RawResponse::transport_failure(err.to_string())
            }
        }
    }
}

fn build_agent(settings: &AgentSettings) -> Agent {
    let tls = TlsConfig::builder()
        .disable_verification(!settings.verify_peer)
        .build();
    Agent::config_builder()
        .https_only(true)
        .max_redirects(0)
        .http_status_as_error(false)
        .timeout_connect(Some(settings.connect_timeout))
        .timeout_global(Some(settings.total_timeout))
        .tls_config(tls)
        .build()
        .new_agent()
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn is_https(url: &str) -> bool {
    url.get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
}

/// Headers with the API key replaced, for diagnostics.
fn masked_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case(AUTH_HEADER) {
                (name.clone(), "***".to_string())
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}
