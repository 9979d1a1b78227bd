//! Endpoint dispatch: from a call name and its arguments to a request plan.
//!
//! # Design
//! A call is either explicit (`CallDescriptor::new(HttpMethod::Get,
//! "article", args)`) or symbolic (`CallDescriptor::parse("getArticle",
//! args)`). Symbolic names carry the verb as a case-insensitive prefix; the
//! rest is the endpoint token. The service routes on lower-case names, so the
//! token is always lower-cased. Underscores inside the token are kept.
//!
//! GET and DELETE turn their arguments into path segments
//! (`article/-1/1`). Each argument is exactly one segment: string arguments
//! are percent-encoded, so a space, `?`, `#` or `/` inside a value cannot
//! break the URL or address a different resource. POST and PUT take a single
//! JSON object as the body and never extend the path.

use serde_json::{Map, Value};

use crate::error::DispatchError;
use crate::http::HttpMethod;

/// Verb prefixes, checked in this order.
const PREFIXES: [(&str, HttpMethod); 4] = [
    ("get", HttpMethod::Get),
    ("post", HttpMethod::Post),
    ("put", HttpMethod::Put),
    ("delete", HttpMethod::Delete),
];

/// Separators tolerated between the verb prefix and the endpoint token,
/// e.g. `get_article` or `delete-article`.
const PREFIX_SEPARATORS: &[char] = &['_', '-', '.', ':', ' '];

/// A call on an endpoint before it is checked.
#[derive(Debug, Clone, PartialEq)]
pub struct CallDescriptor {
    pub method: HttpMethod,
    /// Lower-cased endpoint token.
    pub endpoint: String,
    pub args: Vec<Value>,
}

/// What to send: method, path relative to the base URL, optional body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Map<String, Value>>,
}

impl CallDescriptor {
    pub fn new(method: HttpMethod, endpoint: &str, args: Vec<Value>) -> Self {
        Self {
            method,
            endpoint: endpoint.to_lowercase(),
            args,
        }
    }

    /// Split a symbolic call name such as `getArticle_Stock` into verb and
    /// endpoint.
    pub fn parse(name: &str, args: Vec<Value>) -> Result<Self, DispatchError> {
        let (method, rest) = split_verb(name).ok_or_else(|| DispatchError::UnsupportedOperation {
            name: name.to_string(),
        })?;
        let endpoint = rest.trim_start_matches(PREFIX_SEPARATORS);
        if endpoint.is_empty() {
            return Err(DispatchError::MissingEndpoint {
                name: name.to_string(),
            });
        }
        Ok(Self::new(method, endpoint, args))
    }

    /// Derive the request plan, checking the arguments against the verb.
    pub fn plan(&self) -> Result<RequestPlan, DispatchError> {
        if self.endpoint.is_empty() {
            return Err(DispatchError::MissingEndpoint {
                name: self.method.as_str().to_lowercase(),
            });
        }

        if self.method.has_body() {
            let body = match self.args.as_slice() {
                [Value::Object(body)] => body.clone(),
                [_] => {
                    return Err(DispatchError::BodyNotObject {
                        method: self.method,
                        endpoint: self.endpoint.clone(),
                    })
                }
                other => {
                    return Err(DispatchError::BodyArity {
                        method: self.method,
                        endpoint: self.endpoint.clone(),
                        count: other.len(),
                    })
                }
            };
            return Ok(RequestPlan {
                method: self.method,
                path: self.endpoint.clone(),
                body: Some(body),
            });
        }

        let mut path = self.endpoint.clone();
        for (index, arg) in self.args.iter().enumerate() {
            let segment = path_segment(arg).ok_or_else(|| DispatchError::InvalidPathArgument {
                endpoint: self.endpoint.clone(),
                index,
            })?;
            path.push('/');
            path.push_str(&segment);
        }
        Ok(RequestPlan {
            method: self.method,
            path,
            body: None,
        })
    }
}

fn split_verb(name: &str) -> Option<(HttpMethod, &str)> {
    PREFIXES.iter().find_map(|(prefix, method)| {
        let head = name.get(..prefix.len())?;
        head.eq_ignore_ascii_case(prefix)
            .then(|| (*method, &name[prefix.len()..]))
    })
}

/// String form of a scalar argument. Strings are percent-encoded, `null` is
/// an empty segment, arrays and objects have no path form.
fn path_segment(arg: &Value) -> Option<String> {
    match arg {
        Value::String(text) => Some(encode_segment(text)),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_segment(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                output.push(byte as char);
            }
            _ => output.push_str(&format!("%{byte:02X}")),
        }
    }
    output
}
