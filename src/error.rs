use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, ThisError)]
pub enum GatewayError {
    #[error("Invalid arguments count: expected at least {expected}, got {actual}.")]
    InvalidArgumentsCount { expected: usize, actual: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Method requires authentication.")]
    AuthenticationFailure,

    #[error("Method requires special user group.")]
    InvalidUserGroup,

    #[error("{0}")]
    Query(String),

    #[error("Database Query Error: {0}")]
    Database(#[from] SqlxError),

    #[error("Unknown API method: {0}")]
    MethodNotFound(String),
}

impl GatewayError {
    pub fn query(message: impl Into<String>) -> Self {
        GatewayError::Query(message.into())
    }

    /// Wire name of the error kind, as reported in the response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidArgumentsCount { .. } | GatewayError::InvalidArgument(_) => {
                "InvalidArgumentsCount"
            }
            GatewayError::AuthenticationFailure => "AuthenticationFailure",
            GatewayError::InvalidUserGroup => "InvalidUserGroup",
            GatewayError::Query(_) | GatewayError::Database(_) => "QueryError",
            GatewayError::MethodNotFound(_) => "MethodNotFound",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidArgumentsCount { .. } | GatewayError::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            GatewayError::InvalidUserGroup => StatusCode::FORBIDDEN,
            GatewayError::Query(_) | GatewayError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::MethodNotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = ApiResponse::fail(self.kind(), self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Standardized response envelope shared by successes and failures.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub error: Option<&'static str>,
    pub message: Option<String>,
    pub data: Value,
}

impl ApiResponse {
    pub fn ok(data: impl Into<Value>) -> Self {
        Self {
            success: true,
            error: None,
            message: None,
            data: data.into(),
        }
    }

    pub fn fail(kind: &'static str, message: String) -> Self {
        Self {
            success: false,
            error: Some(kind),
            message: Some(message),
            data: Value::Null,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_and_query_errors_share_the_query_kind() {
        let db = GatewayError::Database(SqlxError::RowNotFound);
        assert_eq!(db.kind(), "QueryError");
        assert!(db.to_string().starts_with("Database Query Error: "));
        assert_eq!(GatewayError::query("Response is empty.").kind(), "QueryError");
    }

    #[test]
    fn failure_envelope_carries_kind_and_message() {
        let err = GatewayError::InvalidArgumentsCount {
            expected: 3,
            actual: 1,
        };
        let body = serde_json::to_value(ApiResponse::fail(err.kind(), err.to_string()))
            .expect("serialize envelope");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "InvalidArgumentsCount");
        assert_eq!(
            body["message"],
            "Invalid arguments count: expected at least 3, got 1."
        );
        assert!(body["data"].is_null());
    }
}
