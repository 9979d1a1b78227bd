//! Response classification.
//!
//! Every `RawResponse` ends in exactly one of four states, checked in order:
//!
//! 1. transport failure: logged, recorded with code -1, empty outcome;
//! 2. body is not JSON: raw body logged and returned, no record;
//! 3. body is an object with a non-null `errorcode`: recorded (even when 0),
//!    and when non-zero logged with its table description and returned as an
//!    application error;
//! 4. anything else: success, body returned unchanged.

use serde_json::Value;

use crate::http::RawResponse;
use crate::log::{log_value, LogSink, Severity};
use crate::types::{ErrorKind, ErrorRecord, Outcome, UNKNOWN_ERROR_CODE, UNKNOWN_ERROR_STRING};

/// Application error codes the service documents. Codes 2, 8 and 9 are not
/// assigned.
pub const ERROR_CODES: [(i64, &str); 11] = [
    (0, "No data found"),
    (1, "Query error"),
    (3, "No access to data"),
    (4, "Unsupported"),
    (5, "Parameter missing"),
    (6, "Couldn't parse parameter"),
    (7, "Parameter wrong type"),
    (10, "Internal error"),
    (11, "Data error"),
    (12, "Not authorized"),
    (13, "Excessive use"),
];

/// Table description for `code`.
pub fn describe_error_code(code: i64) -> Option<&'static str> {
    ERROR_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, description)| *description)
}

/// A classified response: what the caller gets back and what the client
/// keeps as its last error.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub outcome: Outcome,
    pub error: Option<ErrorRecord>,
}

/// Classify `raw`, logging failures to `log`.
///
/// Pure apart from logging: the same response always yields the same
/// `Classified`.
pub fn classify(raw: &RawResponse, log: &dyn LogSink) -> Classified {
    if let Some(message) = &raw.transport_error {
        log.log(Severity::Error, message);
        return Classified {
            outcome: Outcome::TransportFailure,
            error: Some(ErrorRecord::transport(message.clone())),
        };
    }

    let body: Value = match serde_json::from_str(&raw.body) {
        Ok(body) => body,
        Err(_) => {
            log.log(Severity::Error, &raw.body);
            return Classified {
                outcome: Outcome::DecodeFailure(raw.body.clone()),
                error: None,
            };
        }
    };

    let Some(code_field) = body.get("errorcode").filter(|code| !code.is_null()) else {
        return Classified {
            outcome: Outcome::Success(body),
            error: None,
        };
    };

    let errorcode = parse_error_code(code_field);
    let description = describe_error_code(errorcode);
    let kind = match (errorcode, description) {
        (0, _) => ErrorKind::NonFatal,
        (_, Some(_)) => ErrorKind::KnownApplication,
        (_, None) => ErrorKind::UnknownApplication,
    };
    let record = ErrorRecord {
        kind,
        errorcode,
        raw_errorcode: code_field.clone(),
        errorstring: error_string(&body),
        moreinfo: description.map(str::to_string),
        payload: Some(body.clone()),
    };

    if kind == ErrorKind::NonFatal {
        return Classified {
            outcome: Outcome::Success(body),
            error: Some(record),
        };
    }

    log_value(log, Severity::Error, &record.to_value());
    Classified {
        outcome: Outcome::ApplicationError(body),
        error: Some(record),
    }
}

/// Lookup key for `value`. Integers, integral floats and numeric strings
/// within `i64` range are accepted; anything else is an unmapped code.
fn parse_error_code(value: &Value) -> i64 {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .filter(|f| (i64::MIN as f64..i64::MAX as f64).contains(f))
                    .map(|f| f as i64)
            })
            .unwrap_or(UNKNOWN_ERROR_CODE),
        Value::String(text) => text.trim().parse().unwrap_or(UNKNOWN_ERROR_CODE),
        _ => UNKNOWN_ERROR_CODE,
    }
}

fn error_string(body: &Value) -> String {
    match body.get("errorstring") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => UNKNOWN_ERROR_STRING.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemorySink;
    use serde_json::json;

    fn ok(body: &str) -> RawResponse {
        RawResponse::new(200, Vec::new(), body)
    }

    #[test]
    fn plain_payload_is_a_success() {
        let sink = MemorySink::new();
        let result = classify(&ok(r#"{"article_id":10,"name":"Shoe"}"#), &sink);
        assert_eq!(result.outcome, Outcome::Success(json!({"article_id": 10, "name": "Shoe"})));
        assert!(result.error.is_none());
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn successful_bodies_survive_reencoding() {
        let sink = MemorySink::new();
        let body = r#"{"articles":[{"id":1,"price":12.5,"tags":["a","b"]}],"page":1,"more":null}"#;
        let result = classify(&ok(body), &sink);
        let reencoded = serde_json::to_string(result.outcome.success().unwrap()).unwrap();
        let original: Value = serde_json::from_str(body).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&reencoded).unwrap(), original);
    }

    #[test]
    fn bare_scalars_and_arrays_are_successes() {
        let sink = MemorySink::new();
        assert_eq!(classify(&ok("42"), &sink).outcome, Outcome::Success(json!(42)));
        assert_eq!(classify(&ok("[1,2]"), &sink).outcome, Outcome::Success(json!([1, 2])));
    }

    #[test]
    fn known_application_error_gets_description() {
        let sink = MemorySink::new();
        let result = classify(&ok(r#"{"errorcode":5,"errorstring":"missing param"}"#), &sink);

        assert_eq!(
            result.outcome,
            Outcome::ApplicationError(json!({"errorcode": 5, "errorstring": "missing param"}))
        );
        let record = result.error.unwrap();
        assert_eq!(record.kind, ErrorKind::KnownApplication);
        assert_eq!(record.errorcode, 5);
        assert_eq!(record.errorstring, "missing param");
        assert_eq!(record.moreinfo.as_deref(), Some("Parameter missing"));

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, Severity::Error);
        assert!(entries[0].1.contains("Parameter missing"));
    }

    #[test]
    fn every_listed_code_gets_its_description() {
        let sink = MemorySink::new();
        for (code, description) in ERROR_CODES {
            let body = json!({"errorcode": code, "errorstring": "x"}).to_string();
            let record = classify(&ok(&body), &sink).error.unwrap();
            assert_eq!(record.errorcode, code);
            assert_eq!(record.moreinfo.as_deref(), Some(description), "code {code}");
        }
    }

    #[test]
    fn unlisted_codes_are_recorded_without_description() {
        let sink = MemorySink::new();
        for code in [2, 8, 9, 14, 99, -7] {
            let body = json!({"errorcode": code}).to_string();
            let result = classify(&ok(&body), &sink);
            assert_eq!(result.outcome, Outcome::ApplicationError(json!({"errorcode": code})));
            let record = result.error.unwrap();
            assert_eq!(record.kind, ErrorKind::UnknownApplication);
            assert_eq!(record.errorcode, code);
            assert_eq!(record.raw_errorcode, json!(code));
            assert_eq!(record.errorstring, "unknownerror");
            assert!(record.moreinfo.is_none());
        }
        assert_eq!(sink.count(Severity::Error), 6);
    }

    #[test]
    fn zero_code_is_recorded_but_succeeds() {
        let sink = MemorySink::new();
        let result = classify(&ok(r#"{"errorcode":0,"errorstring":"","rows":[]}"#), &sink);
        assert!(result.outcome.is_success());
        let record = result.error.unwrap();
        assert_eq!(record.kind, ErrorKind::NonFatal);
        assert_eq!(record.moreinfo.as_deref(), Some("No data found"));
        assert!(!record.is_failure());
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn null_errorcode_counts_as_absent() {
        let sink = MemorySink::new();
        let result = classify(&ok(r#"{"errorcode":null,"name":"Shoe"}"#), &sink);
        assert!(result.outcome.is_success());
        assert!(result.error.is_none());
    }

    #[test]
    fn numeric_string_codes_are_parsed() {
        let sink = MemorySink::new();
        let record = classify(&ok(r#"{"errorcode":"12","errorstring":"denied"}"#), &sink)
            .error
            .unwrap();
        assert_eq!(record.errorcode, 12);
        assert_eq!(record.moreinfo.as_deref(), Some("Not authorized"));
    }

    #[test]
    fn non_numeric_codes_are_unmapped_failures() {
        let sink = MemorySink::new();
        let result = classify(&ok(r#"{"errorcode":"boom"}"#), &sink);
        assert!(matches!(result.outcome, Outcome::ApplicationError(_)));
        let record = result.error.unwrap();
        assert_eq!(record.errorcode, -1);
        assert_eq!(record.payload, Some(json!({"errorcode": "boom"})));
    }

    #[test]
    fn out_of_range_and_fractional_codes_are_kept_verbatim() {
        let sink = MemorySink::new();
        for (body, raw) in [
            (r#"{"errorcode":18446744073709551615}"#, json!(18446744073709551615u64)),
            (r#"{"errorcode":5.5}"#, json!(5.5)),
            (r#"{"errorcode":1e300}"#, json!(1e300)),
        ] {
            let result = classify(&ok(body), &sink);
            assert!(matches!(result.outcome, Outcome::ApplicationError(_)), "{body}");
            let record = result.error.unwrap();
            assert_eq!(record.kind, ErrorKind::UnknownApplication, "{body}");
            assert_eq!(record.errorcode, -1, "{body}");
            assert_eq!(record.raw_errorcode, raw, "{body}");
            assert!(record.moreinfo.is_none(), "{body}");
            assert_eq!(record.to_value()["errorcode"], raw, "{body}");
        }
    }

    #[test]
    fn integral_float_codes_are_looked_up() {
        let sink = MemorySink::new();
        let record = classify(&ok(r#"{"errorcode":11.0}"#), &sink).error.unwrap();
        assert_eq!(record.errorcode, 11);
        assert_eq!(record.raw_errorcode, json!(11.0));
        assert_eq!(record.moreinfo.as_deref(), Some("Data error"));
    }

    #[test]
    fn non_json_body_is_returned_raw_and_logged() {
        let sink = MemorySink::new();
        let raw = RawResponse::new(503, Vec::new(), "<html>Down for maintenance</html>");
        let result = classify(&raw, &sink);
        assert_eq!(
            result.outcome,
            Outcome::DecodeFailure("<html>Down for maintenance</html>".to_string())
        );
        assert!(result.error.is_none());
        assert_eq!(
            sink.entries(),
            vec![(Severity::Error, "<html>Down for maintenance</html>".to_string())]
        );
    }

    #[test]
    fn transport_failure_records_raw_text() {
        let sink = MemorySink::new();
        let raw = RawResponse::transport_failure("Could not resolve host: demo.cloud.swretail.nl");
        let result = classify(&raw, &sink);
        assert_eq!(result.outcome, Outcome::TransportFailure);
        let record = result.error.unwrap();
        assert_eq!(record.kind, ErrorKind::Transport);
        assert_eq!(record.errorcode, -1);
        assert_eq!(record.errorstring, "Could not resolve host: demo.cloud.swretail.nl");
        assert_eq!(sink.count(Severity::Error), 1);
    }

    #[test]
    fn classification_is_idempotent() {
        let sink = MemorySink::new();
        for raw in [
            ok(r#"{"article_id":10}"#),
            ok(r#"{"errorcode":7,"errorstring":"bad type"}"#),
            ok("not json"),
            RawResponse::transport_failure("timeout"),
        ] {
            assert_eq!(classify(&raw, &sink), classify(&raw, &sink));
        }
    }

    #[test]
    fn http_status_does_not_decide_success() {
        let sink = MemorySink::new();
        let raw = RawResponse::new(404, Vec::new(), r#"{"article_id":10}"#);
        assert!(classify(&raw, &sink).outcome.is_success());
    }
}
