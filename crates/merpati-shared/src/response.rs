//! Response envelope shared by every endpoint:
//! `{status, message, data?, meta?, error?}`.

use serde::{Deserialize, Serialize};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Offset pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Standard successful API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PaginationMeta>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: message.into(),
            data: Some(data),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: PaginationMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl ApiResponse<()> {
    /// Success without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: message.into(),
            data: None,
            meta: None,
        }
    }
}

/// Error envelope. `error` carries an optional detail beyond the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: message.into(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn not_found() -> Self {
        Self::new("API endpoint not found")
    }

    pub fn internal_error() -> Self {
        Self::new("internal server error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_omits_empty_fields() {
        let json = serde_json::to_value(ApiResponse::message("post deleted")).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "post deleted");
        assert!(json.get("data").is_none());
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn test_list_envelope_carries_meta() {
        let meta = PaginationMeta {
            total: 25,
            limit: 10,
            offset: 20,
        };
        let json = serde_json::to_value(ApiResponse::ok("ok", vec![1, 2]).with_meta(meta)).unwrap();

        assert_eq!(json["meta"]["total"], 25);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_error_envelope() {
        let json = serde_json::to_value(ErrorResponse::new("invalid format")).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "invalid format");
        assert!(json.get("error").is_none());
    }
}
