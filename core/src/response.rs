//! Decoding and classification of Brickset response envelopes.
//!
//! Pure functions over a decoded `serde_json::Value`; no client state.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Decode a response body as a JSON object.
pub fn decode(body: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| Error::MalformedResponse(e.to_string()))?;
    if !value.is_object() {
        return Err(Error::MalformedResponse("expected a JSON object".to_string()));
    }
    Ok(value)
}

/// `true` when the envelope reports `"status": "error"`.
///
/// A missing `status` is malformed, not an error report.
pub fn is_error(response: &Value) -> Result<bool> {
    match response.get("status").and_then(Value::as_str) {
        Some(status) => Ok(status == "error"),
        None => Err(Error::MalformedResponse("missing `status` field".to_string())),
    }
}

/// The remote `message`, or a placeholder when it sent none.
pub fn message(response: &Value) -> String {
    response
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("no message")
        .to_string()
}

/// Fail with `InvalidRequest` when the remote reported an error.
pub fn check_response(response: &Value) -> Result<()> {
    if is_error(response)? {
        return Err(Error::InvalidRequest(message(response)));
    }
    Ok(())
}

/// Fail with `InvalidSetId` when a set-scoped lookup matched nothing.
pub fn check_set_id(response: &Value, set_id: &str) -> Result<()> {
    let matches = response
        .get("matches")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::MalformedResponse("missing `matches` field".to_string()))?;
    if matches == 0 {
        return Err(Error::InvalidSetId(set_id.to_string()));
    }
    Ok(())
}

/// Take `field` out of the envelope and decode it.
pub fn extract<T: DeserializeOwned>(mut response: Value, field: &str) -> Result<T> {
    let payload = response
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| Error::MalformedResponse(format!("missing `{field}` field")))?;
    serde_json::from_value(payload)
        .map_err(|e| Error::MalformedResponse(format!("`{field}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_rejects_non_objects() {
        assert!(matches!(decode("not json"), Err(Error::MalformedResponse(_))));
        assert!(matches!(decode("[1,2]"), Err(Error::MalformedResponse(_))));
        assert!(decode(r#"{"status":"success"}"#).is_ok());
    }

    #[test]
    fn check_response_carries_remote_message() {
        let response = json!({"status": "error", "message": "Invalid parameter: pageSize"});
        assert_eq!(
            check_response(&response),
            Err(Error::InvalidRequest("Invalid parameter: pageSize".to_string()))
        );
        assert!(check_response(&json!({"status": "success"})).is_ok());
    }

    #[test]
    fn missing_status_is_malformed() {
        assert!(matches!(
            check_response(&json!({"sets": []})),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn zero_matches_is_invalid_set_id() {
        let response = json!({"status": "success", "matches": 0, "instructions": []});
        assert_eq!(
            check_set_id(&response, "0000"),
            Err(Error::InvalidSetId("0000".to_string()))
        );
        let found = json!({"status": "success", "matches": 2});
        assert!(check_set_id(&found, "6905").is_ok());
    }

    #[test]
    fn missing_matches_is_malformed() {
        assert!(matches!(
            check_set_id(&json!({"status": "success"}), "6905"),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn extract_decodes_named_field() {
        let response = json!({"status": "success", "years": ["2008", "2009"]});
        let years: Vec<String> = extract(response, "years").unwrap();
        assert_eq!(years, vec!["2008", "2009"]);
    }

    #[test]
    fn extract_missing_field_is_malformed() {
        let err = extract::<Vec<String>>(json!({"status": "success"}), "themes").unwrap_err();
        assert_eq!(err, Error::MalformedResponse("missing `themes` field".to_string()));
    }
}
