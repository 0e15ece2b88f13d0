use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error envelope shared by every service endpoint. Mirrors the success
/// envelope (`{"success": true, "data": ...}`) with `success: false`.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub success: bool,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i32>,
}

/// Error kinds surfaced by the marketplace core.
///
/// `Datastore` is deliberately opaque: the underlying driver error is logged
/// at construction and never serialized into the response body.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Forbidden { code: &'static str },
    Validation { code: &'static str, message: Option<String> },
    NotFound { code: &'static str },
    InsufficientStock { part_title: String, available: i32 },
    Conflict { code: &'static str },
    Datastore,
}

impl ApiError {
    pub fn validation(code: &'static str) -> Self {
        Self::Validation { code, message: None }
    }

    pub fn validation_msg(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation { code, message: Some(message.into()) }
    }

    /// Log the storage failure and collapse it into the generic variant.
    pub fn datastore<E: std::fmt::Display>(err: E) -> Self {
        tracing::error!(error = %err, "datastore failure");
        Self::Datastore
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InsufficientStock { .. } => StatusCode::CONFLICT,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Datastore => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Unauthorized => ErrorBody {
                success: false,
                code: "unauthorized".into(),
                message: Some("Unauthorized access".into()),
                available: None,
            },
            ApiError::Forbidden { code } => ErrorBody {
                success: false,
                code: code.into(),
                message: None,
                available: None,
            },
            ApiError::Validation { code, message } => ErrorBody {
                success: false,
                code: code.into(),
                message,
                available: None,
            },
            ApiError::NotFound { code } => ErrorBody {
                success: false,
                code: code.into(),
                message: None,
                available: None,
            },
            ApiError::InsufficientStock { part_title, available } => ErrorBody {
                success: false,
                code: "insufficient_stock".into(),
                message: Some(format!(
                    "Not enough stock for {part_title}. Available: {available}"
                )),
                available: Some(available),
            },
            ApiError::Conflict { code } => ErrorBody {
                success: false,
                code: code.into(),
                message: None,
                available: None,
            },
            ApiError::Datastore => ErrorBody {
                success: false,
                code: "datastore_error".into(),
                message: None,
                available: None,
            },
        };
        let code = body.code.clone();
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(&code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
