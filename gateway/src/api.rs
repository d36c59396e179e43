use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use rightnow_core::{ChatError, RelayReply, ToolDefinition};

// Output: the final answer for /api/chat
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

// Output: any failure, always a single message
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// Output: what the data service currently offers
#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub available: bool,
    pub tools: Vec<ToolDefinition>,
}

// Input: outbound WhatsApp message. Both fields are checked by the relay.
#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
    pub to: Option<String>,
    pub message: Option<String>,
}

pub struct ApiError(pub ChatError);

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!("Error in chat API: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ErrorResponse {
            error: self.0.user_message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub struct Relayed(pub RelayReply);

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json::<Value>(self.0.body)).into_response()
    }
}
