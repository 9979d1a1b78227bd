//! Plain-data HTTP request and response types.
//!
//! # Design
//! The client builds an `HttpRequest` for every call and hands it to a
//! `Transport`, which answers with a `RawResponse`. Neither type knows about
//! the network, so dispatch and classification stay deterministic and can be
//! tested without sockets.
//!
//! A `RawResponse` either carries a status, headers and body, or a
//! transport failure. When `transport_error` is set the other fields carry no
//! HTTP meaning.

use std::fmt;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// POST and PUT carry a JSON body; GET and DELETE encode their
    /// arguments in the path.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute (base URL plus endpoint path). `body` is the UTF-8 JSON
/// encoding of the request payload, present only for POST and PUT.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The result of executing an `HttpRequest`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub transport_error: Option<String>,
}

impl RawResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            transport_error: None,
        }
    }

    /// A response for a request that never produced HTTP semantics
    /// (DNS, TLS, timeout, refused scheme, reset connection).
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            transport_error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.transport_error.is_some()
    }
}

/// Status line and headers of the most recent response, kept by the client
/// for inspection after a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}
