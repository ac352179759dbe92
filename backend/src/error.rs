//! Error handling for the Marbo Shop backend
//!
//! Provides consistent error responses in Thai and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid API key")]
    InvalidApiKey,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i32,
        requested: i32,
    },

    // External service errors, all counted against the sync circuit breaker
    #[error("External sync configuration error: {0}")]
    ExternalConfig(String),

    #[error("External service denied access: {0}")]
    ExternalAuth(String),

    #[error("External resource not found: {0}")]
    ExternalNotFound(String),

    #[error("External service rejected the request: {0}")]
    ExternalBadRequest(String),

    #[error("External service transport error: {0}")]
    ExternalTransport(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_th: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "INVALID_API_KEY".to_string(),
                    message_en: "A valid API key is required".to_string(),
                    message_th: "ต้องใช้ API key ที่ถูกต้อง".to_string(),
                    field: None,
                },
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_th: format!("ข้อมูลไม่ถูกต้อง: {}", message),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_th: format!("ไม่พบ {}", resource),
                    field: None,
                },
            ),
            AppError::InsufficientStock {
                product,
                available,
                requested,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message_en: format!(
                        "Insufficient stock for {}: available {}, requested {}",
                        product, available, requested
                    ),
                    message_th: format!("สินค้า {} มีไม่เพียงพอ (คงเหลือ: {})", product, available),
                    field: None,
                },
            ),
            AppError::ExternalConfig(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "EXTERNAL_CONFIG_ERROR".to_string(),
                    message_en: format!("External sync configuration error: {}", msg),
                    message_th: format!("เกิดข้อผิดพลาดในการตั้งค่าการซิงค์: {}", msg),
                    field: None,
                },
            ),
            AppError::ExternalAuth(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_AUTH_ERROR".to_string(),
                    message_en: format!("External service denied access: {}", msg),
                    message_th: format!("บริการภายนอกปฏิเสธการเข้าถึง: {}", msg),
                    field: None,
                },
            ),
            AppError::ExternalNotFound(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_NOT_FOUND".to_string(),
                    message_en: format!("External resource not found: {}", msg),
                    message_th: format!("ไม่พบข้อมูลในบริการภายนอก: {}", msg),
                    field: None,
                },
            ),
            AppError::ExternalBadRequest(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_BAD_REQUEST".to_string(),
                    message_en: format!("External service rejected the request: {}", msg),
                    message_th: format!("บริการภายนอกปฏิเสธคำขอ: {}", msg),
                    field: None,
                },
            ),
            AppError::ExternalTransport(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_TRANSPORT_ERROR".to_string(),
                    message_en: format!("External service transport error: {}", msg),
                    message_th: format!("เกิดข้อผิดพลาดในการเชื่อมต่อบริการภายนอก: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_th: "เกิดข้อผิดพลาดกับฐานข้อมูล".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_th: "เกิดข้อผิดพลาดภายในเซิร์ฟเวอร์".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_th: "เกิดข้อผิดพลาดภายในเซิร์ฟเวอร์".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
