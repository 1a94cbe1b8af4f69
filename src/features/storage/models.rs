use serde::{Deserialize, Serialize};

/// 图床返回的上传结果。除 `url` 外的字段仅用于日志，不参与业务。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    /// 可公开访问的资源地址
    pub url: String,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}
