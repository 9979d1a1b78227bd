//! Error types for the SW-Retail client.
//!
//! # Design
//! Only mistakes in how the client is configured or called are `Err` values.
//! Network, decode and server-side failures are ordinary outcomes of a call
//! and are reported through `Outcome` and the client's last-error record
//! instead (see `types`).

use thiserror::Error;

use crate::http::HttpMethod;

/// A call could not be turned into an HTTP request. No request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The call name does not start with `get`, `post`, `put` or `delete`.
    #[error("unsupported operation '{name}': endpoints must be called with a get, post, put or delete prefix")]
    UnsupportedOperation { name: String },

    /// Nothing is left of the call name once the verb prefix is removed.
    #[error("'{name}' does not name an endpoint after its verb prefix")]
    MissingEndpoint { name: String },

    /// POST and PUT take exactly one argument, the request body.
    #[error("{method} {endpoint} takes exactly one body argument, got {count}")]
    BodyArity {
        method: HttpMethod,
        endpoint: String,
        count: usize,
    },

    /// The single POST/PUT argument is not a JSON object.
    #[error("{method} {endpoint} body must be a JSON object")]
    BodyNotObject { method: HttpMethod, endpoint: String },

    /// A GET/DELETE argument is an array or object and has no path form.
    #[error("argument {index} of {endpoint} cannot be used as a path segment")]
    InvalidPathArgument { endpoint: String, index: usize },
}

/// The client configuration is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid instance name '{0}': expected ASCII letters, digits or '-'")]
    InvalidInstance(String),

    #[error("API key must not be empty")]
    MissingApiKey,

    #[error("environment variable {0} is not set")]
    MissingVariable(&'static str),

    #[error("{name}={value} is not a boolean")]
    InvalidFlag { name: &'static str, value: String },
}
