//! Verify dispatch and classification against the JSON test vectors in
//! `test-vectors/`.
//!
//! Each case names a symbolic call, the request it must produce, a simulated
//! response and the expected outcome and last error. Bodies are compared as
//! parsed JSON so field order does not matter.

use std::sync::Arc;

use serde_json::Value;
use swretail_core::{
    ClientConfig, HttpMethod, HttpRequest, MemorySink, Outcome, RawResponse, SwRetailClient,
    Transport, TransportOptions,
};

/// Replays one simulated response and keeps the request it was given.
struct Replay {
    response: RawResponse,
    sent: Option<HttpRequest>,
}

impl Transport for Replay {
    fn execute(&mut self, request: &HttpRequest, _options: &TransportOptions) -> RawResponse {
        self.sent = Some(request.clone());
        self.response.clone()
    }
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn simulated_response(sim: &Value) -> RawResponse {
    match sim.get("transport_error") {
        Some(message) => RawResponse::transport_failure(message.as_str().unwrap()),
        None => RawResponse::new(
            sim["status"].as_u64().unwrap() as u16,
            Vec::new(),
            sim["body"].as_str().unwrap(),
        ),
    }
}

fn check_outcome(name: &str, outcome: &Outcome, expected: &Value) {
    match expected["kind"].as_str().unwrap() {
        "success" => assert_eq!(outcome, &Outcome::Success(expected["payload"].clone()), "{name}"),
        "application_error" => assert_eq!(
            outcome,
            &Outcome::ApplicationError(expected["payload"].clone()),
            "{name}"
        ),
        "transport_failure" => assert_eq!(outcome, &Outcome::TransportFailure, "{name}"),
        "decode_failure" => assert_eq!(
            outcome,
            &Outcome::DecodeFailure(expected["raw"].as_str().unwrap().to_string()),
            "{name}"
        ),
        other => panic!("{name}: unknown outcome kind: {other}"),
    }
}

#[test]
fn call_test_vectors() {
    let raw = include_str!("../../test-vectors/calls.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let transport = Replay {
            response: simulated_response(&case["simulated_response"]),
            sent: None,
        };
        let mut client = SwRetailClient::with_transport(
            ClientConfig::new("demo", "secret").unwrap(),
            transport,
            Arc::new(MemorySink::new()),
        );

        let call = &case["call"];
        let args = call["args"].as_array().unwrap().clone();
        let outcome = client.invoke(call["name"].as_str().unwrap(), args).unwrap();

        // Verify the request
        let expected_req = &case["expected_request"];
        let sent = client.transport().sent.clone().unwrap();
        assert_eq!(sent.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(sent.url, format!("{base_url}{}", expected_req["path"].as_str().unwrap()), "{name}: url");
        assert_eq!(sent.header("X-Auth"), Some("secret"), "{name}: auth header");
        match &expected_req["body"] {
            Value::Null => assert!(sent.body.is_none(), "{name}: body should be None"),
            body => {
                let sent_body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
                assert_eq!(&sent_body, body, "{name}: body");
            }
        }

        // Verify the outcome
        check_outcome(name, &outcome, &case["expected_outcome"]);

        // Verify the last error
        match &case["expected_error"] {
            Value::Null => assert!(client.last_error().is_none(), "{name}: expected no error"),
            expected => {
                let record = client.last_error().unwrap();
                assert_eq!(record.errorcode, expected["errorcode"].as_i64().unwrap(), "{name}: errorcode");
                assert_eq!(record.raw_errorcode, expected["errorcode"], "{name}: raw errorcode");
                assert_eq!(record.errorstring, expected["errorstring"].as_str().unwrap(), "{name}: errorstring");
                assert_eq!(record.moreinfo.as_deref(), expected["moreinfo"].as_str(), "{name}: moreinfo");
            }
        }
    }
}
