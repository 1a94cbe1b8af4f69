pub mod imagekit;
pub mod models;

use async_trait::async_trait;
use axum::body::Bytes;

use crate::error::StorageError;

pub use imagekit::ImageKitClient;
pub use models::UploadedImage;

/// 外部图床的最小能力：上传一段字节并返回可公开访问的 URL。
///
/// 实现需要可在多个并发请求之间共享（`Send + Sync`），调用方不额外加锁。
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(
        &self,
        bytes: Bytes,
        file_name: &str,
        folder: &str,
    ) -> Result<UploadedImage, StorageError>;
}
