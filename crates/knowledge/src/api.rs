//! Request and response payloads of the analyze and chat entry points.
//!
//! Missing or `null` request fields decode to empty values so validation
//! reports them as `InvalidRequest` rather than failing in the decoder.

use crate::types::{null_default, BusinessInfo};
use dot_core::AppError;
use dot_llm::ChatMessage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default, alias = "dotId", deserialize_with = "null_default")]
    pub tenant_id: String,

    #[serde(default, deserialize_with = "null_default")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub session_id: String,
    pub urls_analyzed: u32,
    pub chunks_created: u32,
    pub business_info: BusinessInfo,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, alias = "dotId", deserialize_with = "null_default")]
    pub tenant_id: String,

    #[serde(default, deserialize_with = "null_default")]
    pub message: String,

    /// Prior turns, oldest first.
    #[serde(default, deserialize_with = "null_default")]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub relevant_chunks_used: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Body for a failed `operation` ("Analysis", "Chat").
    pub fn from_error(operation: &str, err: &AppError) -> Self {
        match err {
            AppError::InvalidRequest(message) => Self {
                error: message.clone(),
                details: None,
            },
            AppError::NotFound(_) => Self {
                error: "Dot not found".to_string(),
                details: None,
            },
            other => Self {
                error: format!("{} failed", operation),
                details: Some(other.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_accept_dot_id_and_nulls() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"dotId": "d1", "url": null}"#).unwrap();
        assert_eq!(request.tenant_id, "d1");
        assert_eq!(request.url, "");
        assert_eq!(request.custom_instructions, None);

        let chat: ChatRequest = serde_json::from_str(
            r#"{"tenantId": "d1", "message": "hi", "history": [
                {"id": "1", "role": "user", "content": "hello", "timestamp": "2024-01-01T00:00:00Z"},
                {"id": "2", "role": "assistant", "content": "hey"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(chat.history.len(), 2);
        assert_eq!(chat.history[1], ChatMessage::assistant("hey"));

        let empty: ChatRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ChatRequest::default());
    }

    #[test]
    fn test_response_field_names() {
        let value = serde_json::to_value(ChatResponse {
            response: "ok".to_string(),
            relevant_chunks_used: 2,
        })
        .unwrap();
        assert_eq!(value["relevantChunksUsed"], 2);

        let value = serde_json::to_value(AnalyzeResponse {
            success: true,
            session_id: "s1".to_string(),
            urls_analyzed: 1,
            chunks_created: 3,
            business_info: BusinessInfo::default(),
            message: "done".to_string(),
        })
        .unwrap();
        assert_eq!(value["sessionId"], "s1");
        assert_eq!(value["chunksCreated"], 3);
        assert!(value.get("businessInfo").is_some());
    }

    #[test]
    fn test_error_bodies() {
        let body = ErrorResponse::from_error("Chat", &AppError::InvalidRequest("message is required".into()));
        assert_eq!(body.error, "message is required");
        assert_eq!(body.details, None);

        let body = ErrorResponse::from_error("Analysis", &AppError::NotFound("dot x".into()));
        assert_eq!(body.error, "Dot not found");

        let body = ErrorResponse::from_error("Analysis", &AppError::Store("disk full".into()));
        assert_eq!(body.error, "Analysis failed");
        assert!(body.details.unwrap().contains("disk full"));

        let json = serde_json::to_value(ErrorResponse::from_error("Chat", &AppError::NotFound("x".into()))).unwrap();
        assert!(json.get("details").is_none());
    }
}
