//! The single JSON response shape every HTTP endpoint returns.

use serde::Serialize;
use serde_json::Value;

/// `{ success, message, data, error?, meta? }`, matching the contract every
/// endpoint listed in the HTTP surface honors.
#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error: None,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl ApiEnvelope<Value> {
    pub fn err(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Value::Null,
            error: Some(error.into()),
            meta: None,
        }
    }

    pub fn err_with_data(message: impl Into<String>, error: impl Into<String>, data: Value) -> Self {
        Self {
            success: false,
            message: message.into(),
            data,
            error: Some(error.into()),
            meta: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_has_no_error_field_in_json() {
        let env = ApiEnvelope::ok("done", serde_json::json!({"x": 1}));
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["success"], true);
        assert!(v.get("error").is_none());
    }

    #[test]
    fn err_envelope_carries_conflict_data() {
        let env = ApiEnvelope::err_with_data(
            "conflict",
            "approval_override_required",
            serde_json::json!({"approved_conflict_days": [3]}),
        );
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["data"]["approved_conflict_days"][0], 3);
    }
}
