//! Blocking client for the SW-Retail REST service.
//!
//! # Overview
//! Calls are named the way the service names its endpoints, prefixed with
//! the HTTP verb: `getArticle(10)` becomes `GET article/10`,
//! `putArticle({...})` becomes `PUT article` with a JSON body.
//!
//! ```no_run
//! use serde_json::json;
//! use swretail_core::SwRetailClient;
//!
//! let mut client = SwRetailClient::new("your-cloud-instance", "apikey")?;
//! let outcome = client.invoke("getArticle", vec![json!(10)])?;
//! if let Some(error) = client.last_error() {
//!     eprintln!("call failed: {} ({})", error.errorstring, error.errorcode);
//! }
//! # let _ = outcome;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Design
//! - `dispatch` maps a call name and arguments to a method, path and body.
//! - `transport` executes the request over HTTPS with `ureq`.
//! - `classify` decides between success, transport failure, undecodable body
//!   and application error.
//! - `SwRetailClient` ties them together and keeps the last error.
//! - Only misuse (bad call names or arguments, bad configuration) is an
//!   `Err`; every runtime failure is an `Outcome` plus a last-error record.

pub mod classify;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod helpers;
pub mod http;
pub mod log;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

pub use classify::{classify, describe_error_code, Classified, ERROR_CODES};
pub use client::SwRetailClient;
pub use config::ClientConfig;
pub use dispatch::{CallDescriptor, RequestPlan};
pub use error::{ConfigError, DispatchError};
pub use http::{HttpMethod, HttpRequest, RawResponse, ResponseMeta};
pub use log::{LineSink, LogSink, MemorySink, Severity, TracingSink};
pub use transport::{Transport, TransportOptions, UreqTransport};
pub use types::{ErrorKind, ErrorRecord, Outcome};
