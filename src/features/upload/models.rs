use axum::body::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::{ImageKitConfig, UploadConfig};

/// 上传成功的响应体，只包含 `url` 一个字段。
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[schema(example = json!({ "url": "https://ik.imagekit.io/demo/instacard-profiles/avatar.png" }))]
pub struct UploadResponse {
    /// 图床返回的公开访问地址
    pub url: String,
}

/// multipart 表单的 OpenAPI 描述
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// 待上传的图片文件
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// 已完整读入内存的上传文件，生命周期与单个请求一致。
#[derive(Debug, Clone)]
pub struct BufferedFile {
    pub bytes: Bytes,
    /// 客户端声明的原始文件名
    pub file_name: String,
}

/// 上传入口的运行时参数
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// multipart 中承载文件的字段名
    pub field_name: String,
    /// 图床目标目录（固定值，不从请求推导）
    pub folder: String,
    /// 请求体上限（字节）
    pub max_body_bytes: usize,
}

impl UploadSettings {
    pub fn from_config(upload: &UploadConfig, imagekit: &ImageKitConfig) -> Self {
        Self {
            field_name: upload.field_name.clone(),
            folder: imagekit.folder.clone(),
            max_body_bytes: upload.max_body_bytes,
        }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default(), &ImageKitConfig::default())
    }
}
