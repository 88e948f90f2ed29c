//! Decodes a webhook body into a `serde_json::Value`, regardless of
//! whether the forge sent `application/json` or
//! `application/x-www-form-urlencoded` with a single `payload=<urlencoded
//! json>` field (spec.md §4.A: "both produce the same logical payload").

use serde::Deserialize;
use serde_json::Value;

use super::events::IntakeError;

#[derive(Deserialize)]
struct FormWrapper {
    payload: String,
}

pub fn decode_body(content_type: Option<&str>, raw: &[u8]) -> Result<Value, IntakeError> {
    let is_form = content_type
        .map(|ct| ct.to_ascii_lowercase().starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    if is_form {
        let wrapper: FormWrapper = serde_urlencoded::from_bytes(raw)
            .map_err(|e| IntakeError::MalformedPayload(format!("form body: {e}")))?;
        serde_json::from_str(&wrapper.payload).map_err(|e| IntakeError::MalformedPayload(format!("payload field: {e}")))
    } else {
        serde_json::from_slice(raw).map_err(|e| IntakeError::MalformedPayload(format!("json body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_raw_json() {
        let v = decode_body(Some("application/json"), br#"{"a":1}"#).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn decodes_form_wrapped_payload() {
        let body = "payload=%7B%22a%22%3A1%7D"; // {"a":1}
        let v = decode_body(Some("application/x-www-form-urlencoded"), body.as_bytes()).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = decode_body(Some("application/json"), b"not json").unwrap_err();
        assert!(matches!(err, IntakeError::MalformedPayload(_)));
    }
}
