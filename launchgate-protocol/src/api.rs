use serde::{Deserialize, Serialize};

/// Success envelope returned by every LaunchGate endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 200,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Envelope without a payload, e.g. after a delete.
    pub fn empty() -> Self {
        Self {
            code: 200,
            data: None,
        }
    }
}

/// Error envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_envelope_omits_data() {
        let value = serde_json::to_value(ApiResponse::empty()).expect("serialize");
        assert_eq!(value, json!({ "code": 200 }));
    }
}
