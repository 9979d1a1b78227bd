//! Call results and the last-error record.
//!
//! # Design
//! Payloads stay `serde_json::Value`: endpoint schemas belong to the remote
//! service and are passed through untouched, while callers still match on
//! shape (object, array, scalar) safely.

use serde::Serialize;
use serde_json::{Map, Value};

/// Default error code for failures the server did not number.
pub const UNKNOWN_ERROR_CODE: i64 = -1;

/// Default error string for failures the server did not describe.
pub const UNKNOWN_ERROR_STRING: &str = "unknownerror";

/// Which kind of failure an `ErrorRecord` describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No HTTP exchange took place (DNS, TLS, timeout, refused scheme).
    Transport,
    /// `errorcode` was present, non-zero and listed in the code table.
    KnownApplication,
    /// `errorcode` was present, non-zero and missing from the code table.
    UnknownApplication,
    /// `errorcode` was 0: metadata attached to a successful response.
    NonFatal,
}

/// The client's view of the most recent failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    /// Code used for the table lookup: -1 when the server's value is not an
    /// integer that fits in an `i64`.
    #[serde(skip)]
    pub errorcode: i64,
    /// `errorcode` exactly as the server sent it.
    #[serde(rename = "errorcode")]
    pub raw_errorcode: Value,
    pub errorstring: String,
    /// Description from the error code table, when the code is listed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moreinfo: Option<String>,
    /// The decoded response body that carried the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ErrorRecord {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transport,
            errorcode: UNKNOWN_ERROR_CODE,
            raw_errorcode: Value::from(UNKNOWN_ERROR_CODE),
            errorstring: message.into(),
            moreinfo: None,
            payload: None,
        }
    }

    /// True for everything except a zero error code.
    pub fn is_failure(&self) -> bool {
        self.kind != ErrorKind::NonFatal
    }

    /// The server payload merged over the `{errorcode: -1, errorstring:
    /// "unknownerror"}` defaults, with `moreinfo` attached when known.
    pub fn to_value(&self) -> Value {
        let mut merged = Map::new();
        merged.insert("errorcode".to_string(), Value::from(UNKNOWN_ERROR_CODE));
        merged.insert(
            "errorstring".to_string(),
            Value::from(UNKNOWN_ERROR_STRING),
        );
        match &self.payload {
            Some(Value::Object(fields)) => {
                merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            _ => {
                merged.insert("errorcode".to_string(), self.raw_errorcode.clone());
                merged.insert("errorstring".to_string(), Value::from(self.errorstring.clone()));
            }
        }
        if let Some(info) = &self.moreinfo {
            merged.insert("moreinfo".to_string(), Value::from(info.clone()));
        }
        Value::Object(merged)
    }
}

/// What a call hands back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The decoded body, exactly as the server sent it.
    Success(Value),
    /// The request never completed; there is no body.
    TransportFailure,
    /// The body was not JSON. Carries the raw text.
    DecodeFailure(String),
    /// The decoded error payload (`errorcode` non-zero).
    ApplicationError(Value),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// The decoded body, for successes and application errors alike.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Outcome::Success(value) | Outcome::ApplicationError(value) => Some(value),
            Outcome::TransportFailure | Outcome::DecodeFailure(_) => None,
        }
    }

    pub fn into_payload(self) -> Option<Value> {
        match self {
            Outcome::Success(value) | Outcome::ApplicationError(value) => Some(value),
            Outcome::TransportFailure | Outcome::DecodeFailure(_) => None,
        }
    }

    /// The successful body, if any.
    pub fn success(&self) -> Option<&Value> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }
}
