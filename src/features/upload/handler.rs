use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef, Multipart, State, multipart::MultipartRejection},
    routing::post,
};
use std::sync::Arc;

use crate::error::{AppError, ErrorBody};
use crate::features::storage::ImageStore;

use super::models::{UploadForm, UploadResponse, UploadSettings};
use super::multipart::extract_file;

/// 上传入口依赖的状态：图床客户端 + 固定参数
#[derive(Clone)]
pub struct UploadState {
    pub store: Arc<dyn ImageStore>,
    pub settings: Arc<UploadSettings>,
}

impl UploadState {
    pub fn new(store: Arc<dyn ImageStore>, settings: UploadSettings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
        }
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    summary = "上传头像图片",
    description = "接收 multipart/form-data 中 `image` 字段的单个文件，整体读入内存后转存到 ImageKit，返回公开访问地址。不校验文件类型与大小；上游失败的细节只写日志，不返回给调用方。",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "上传成功", body = UploadResponse),
        (status = 400, description = "请求中没有文件", body = ErrorBody, example = json!({ "error": "No file uploaded" })),
        (status = 500, description = "图床上传失败", body = ErrorBody, example = json!({ "error": "Upload failed" }))
    ),
    tag = "Upload"
)]
pub async fn upload_image(
    State(state): State<UploadState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    // 非 multipart 请求与缺少文件同样处理
    let multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "请求不是 multipart/form-data");
        AppError::MissingFile
    })?;
    let file = extract_file(multipart, &state.settings.field_name)
        .await
        .ok_or(AppError::MissingFile)?;

    tracing::debug!(
        file_name = %file.file_name,
        size = file.bytes.len(),
        "开始转存上传文件"
    );
    let uploaded = state
        .store
        .upload(file.bytes, &file.file_name, &state.settings.folder)
        .await?;

    Ok(Json(UploadResponse { url: uploaded.url }))
}

/// 上传路由。请求体上限交给 `DefaultBodyLimit`，超限时 multipart 读取失败并按未上传文件处理。
pub fn create_upload_router<S>(settings: &UploadSettings) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    UploadState: FromRef<S>,
{
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(settings.max_body_bytes))
}
