//! 网关错误类型与 HTTP 响应映射
//!
//! 所有 handler 返回 `ApiError`，统一渲染为
//! `{success, code, message, data}` 形式的 JSON 响应体。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use notification_service::error::NotificationError;
use store_shared::error::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("未认证")]
    Unauthorized,

    #[error("权限不足: {0}")]
    Forbidden(String),

    #[error("{entity}未找到: id={id}")]
    NotFound { entity: String, id: String },

    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("内部错误: {0}")]
    Internal(String),

    #[error(transparent)]
    Shared(#[from] StoreError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Shared(e) => match e {
                StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                StoreError::Validation(_) | StoreError::InvalidArgument { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
                }
                StoreError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                StoreError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, e.code()),
            },
            Self::Notification(_) => (StatusCode::INTERNAL_SERVER_ERROR, "NOTIFICATION_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = json!({
            "success": false,
            "code": code,
            "message": self.to_string(),
            "data": null,
        });

        (status, Json(body)).into_response()
    }
}
