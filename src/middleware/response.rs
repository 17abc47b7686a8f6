use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Success envelope: `{ success, message, data, count? }`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
    pub count: Option<usize>,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            data,
            message: message.into(),
            count: None,
            status_code: StatusCode::OK,
        }
    }

    /// Create a 201 Created response
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            ..Self::success(message, data)
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// A listing; `count` is the number of items returned
    pub fn list(message: impl Into<String>, data: Vec<T>) -> Self {
        let count = data.len();
        Self {
            count: Some(count),
            ..Self::success(message, data)
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        // Convert data to JSON Value for consistent envelope format
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return crate::error::ApiError::internal_server_error("Erro interno do servidor").into_response();
            }
        };

        let mut envelope = json!({
            "success": true,
            "message": self.message,
            "data": data_value
        });
        if let Some(count) = self.count {
            envelope["count"] = json!(count);
        }

        (self.status_code, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
