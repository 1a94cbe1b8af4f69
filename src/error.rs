use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 上传失败时对外返回的固定文案
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed";
/// 请求中缺少文件时对外返回的固定文案
pub const NO_FILE_MESSAGE: &str = "No file uploaded";
/// 内部错误对外返回的固定文案
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// 应用统一错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 请求未携带约定字段名下的文件
    #[error("未上传文件")]
    MissingFile,

    /// 图床上传失败（细节仅写入日志）
    #[error("图床上传失败: {0}")]
    UploadFailed(#[from] StorageError),

    /// 资源不存在
    #[error("{0}")]
    NotFound(String),

    /// 参数校验错误
    #[error("{0}")]
    Validation(String),

    /// 资源冲突（如用户名已存在）
    #[error("{0}")]
    Conflict(String),

    /// 内部服务器错误（细节仅写入日志）
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 外部图床客户端错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// 网络请求错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 超时
    #[error("超时")]
    Timeout,

    /// 图床返回非 2xx 状态
    #[error("图床拒绝请求: status={status}, body={body}")]
    Rejected {
        /// HTTP 状态码
        status: u16,
        /// 原始响应体（截断后）
        body: String,
    },

    /// 无效的响应
    #[error("无效的响应: {0}")]
    InvalidResponse(String),
}

/// 对外错误响应体，只包含 `error` 一个字段。
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[schema(example = json!({ "error": "Upload failed" }))]
pub struct ErrorBody {
    /// 面向调用方的错误信息
    pub error: String,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::UploadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 对外可见的错误文案。上游与内部错误一律折叠为固定文案。
    fn public_message(&self) -> String {
        match self {
            AppError::MissingFile => NO_FILE_MESSAGE.to_string(),
            AppError::UploadFailed(_) => UPLOAD_FAILED_MESSAGE.to_string(),
            AppError::NotFound(msg) | AppError::Validation(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
            AppError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::UploadFailed(e) => tracing::error!(error = %e, "图床上传失败"),
            AppError::Internal(detail) => tracing::error!(error = %detail, "内部错误"),
            other => tracing::debug!(error = %other, "请求被拒绝"),
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

// =============== Error conversions for common external errors ===============

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StorageError::Timeout
        } else if err.is_decode() {
            StorageError::InvalidResponse(err.to_string())
        } else {
            StorageError::Network(err.to_string())
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(format!("sqlite: {err}"))
    }
}
