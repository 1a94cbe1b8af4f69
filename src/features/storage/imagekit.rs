use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::multipart::{Form, Part};

use crate::config::ImageKitConfig;
use crate::error::{AppError, StorageError};

use super::{ImageStore, UploadedImage};

/// 错误响应体写入日志前的截断长度
const MAX_ERROR_BODY_CHARS: usize = 512;

/// ImageKit 上传客户端
#[derive(Clone)]
pub struct ImageKitClient {
    client: reqwest::Client,
    upload_endpoint: String,
    private_key: String,
    use_unique_file_name: bool,
}

impl ImageKitClient {
    pub fn new(cfg: &ImageKitConfig) -> Result<Self, AppError> {
        let client = crate::http::build_upload_client(cfg.timeout_duration())
            .map_err(|e| AppError::Internal(format!("初始化 HTTP Client 失败: {e}")))?;
        Ok(Self::with_http_client(client, cfg))
    }

    /// 使用外部构建的 `reqwest::Client`（测试中用于缩短超时）。
    pub fn with_http_client(client: reqwest::Client, cfg: &ImageKitConfig) -> Self {
        Self {
            client,
            upload_endpoint: cfg.upload_endpoint.clone(),
            private_key: cfg.private_key.clone(),
            use_unique_file_name: cfg.use_unique_file_name,
        }
    }

    fn build_form(&self, bytes: Bytes, file_name: &str, folder: &str) -> Form {
        let len = bytes.len() as u64;
        let part = Part::stream_with_length(bytes, len).file_name(file_name.to_string());
        Form::new()
            .part("file", part)
            .text("fileName", file_name.to_string())
            .text("folder", folder.to_string())
            .text(
                "useUniqueFileName",
                if self.use_unique_file_name { "true" } else { "false" },
            )
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[async_trait]
impl ImageStore for ImageKitClient {
    async fn upload(
        &self,
        bytes: Bytes,
        file_name: &str,
        folder: &str,
    ) -> Result<UploadedImage, StorageError> {
        let size = bytes.len();
        let form = self.build_form(bytes, file_name, folder);

        let resp = self
            .client
            .post(&self.upload_endpoint)
            .basic_auth(&self.private_key, None::<&str>)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let uploaded: UploadedImage = serde_json::from_str(&body).map_err(|e| {
            StorageError::InvalidResponse(format!(
                "解析上传响应失败: {e}; body={}",
                truncate_chars(&body, MAX_ERROR_BODY_CHARS)
            ))
        })?;
        if uploaded.url.trim().is_empty() {
            return Err(StorageError::InvalidResponse("上传响应缺少 url".to_string()));
        }

        tracing::info!(
            file_name,
            folder,
            size,
            file_id = uploaded.file_id.as_deref().unwrap_or(""),
            "ImageKit 上传成功"
        );
        Ok(uploaded)
    }
}
