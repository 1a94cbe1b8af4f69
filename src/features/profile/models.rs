use serde::{Deserialize, Deserializer, Serialize};

/// 名片（对外展示字段，`delete_code` 只在创建时返回一次）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
#[schema(example = json!({
  "id": 1,
  "username": "alice",
  "profession": "Designer",
  "skills": "Figma, Illustrator",
  "hourly_rate": 35.0,
  "bio": "UI/UX designer",
  "photo": "https://ik.imagekit.io/demo/instacard-profiles/alice.png",
  "github": null,
  "instagram": "@alice",
  "tiktok": null,
  "linkedin": null,
  "whatsapp": null,
  "portfolio1": null,
  "portfolio2": null,
  "portfolio3": null,
  "portfolio4": null,
  "portfolio5": null,
  "is_public": true,
  "created_at": "2025-09-20T04:10:44.000000Z",
  "updated_at": "2025-09-20T04:10:44.000000Z"
}))]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub profession: Option<String>,
    pub skills: Option<String>,
    pub hourly_rate: Option<f64>,
    pub bio: Option<String>,
    /// 头像地址（通常来自上传接口返回的 url）
    pub photo: Option<String>,
    pub github: Option<String>,
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
    pub linkedin: Option<String>,
    pub whatsapp: Option<String>,
    pub portfolio1: Option<String>,
    pub portfolio2: Option<String>,
    pub portfolio3: Option<String>,
    pub portfolio4: Option<String>,
    pub portfolio5: Option<String>,
    pub is_public: bool,
    /// 创建时间（UTC RFC3339）
    pub created_at: String,
    /// 最近更新时间（UTC RFC3339）
    pub updated_at: String,
}

/// 可选文本列的名称，与 `ProfileInput::text_fields` 顺序一致。
pub const TEXT_COLUMNS: [&str; 14] = [
    "profession",
    "skills",
    "bio",
    "photo",
    "github",
    "instagram",
    "tiktok",
    "linkedin",
    "whatsapp",
    "portfolio1",
    "portfolio2",
    "portfolio3",
    "portfolio4",
    "portfolio5",
];

/// 创建/更新请求体。
///
/// 可空字段使用 `Option<Option<T>>`：缺省为 `None`（不修改），显式 `null` 为 `Some(None)`（清空）。
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct ProfileInput {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub profession: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub skills: Option<Option<String>>,
    #[serde(default, alias = "hourlyRate", deserialize_with = "nullable")]
    #[schema(value_type = Option<f64>)]
    pub hourly_rate: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub photo: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub github: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub instagram: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub tiktok: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub linkedin: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub whatsapp: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub portfolio1: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub portfolio2: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub portfolio3: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub portfolio4: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub portfolio5: Option<Option<String>>,
    #[serde(default, alias = "isPublic")]
    pub is_public: Option<bool>,
    /// 删除口令；仅创建时生效，缺省自动生成 UUID
    #[serde(default)]
    pub delete_code: Option<String>,
}

fn nullable<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

impl ProfileInput {
    /// 按 `TEXT_COLUMNS` 的顺序返回可选文本字段。
    pub fn text_fields(&self) -> [&Option<Option<String>>; 14] {
        [
            &self.profession,
            &self.skills,
            &self.bio,
            &self.photo,
            &self.github,
            &self.instagram,
            &self.tiktok,
            &self.linkedin,
            &self.whatsapp,
            &self.portfolio1,
            &self.portfolio2,
            &self.portfolio3,
            &self.portfolio4,
            &self.portfolio5,
        ]
    }

    /// 请求体是否没有任何可更新的字段
    pub fn is_empty_patch(&self) -> bool {
        self.username.is_none()
            && self.hourly_rate.is_none()
            && self.is_public.is_none()
            && self.text_fields().iter().all(|f| f.is_none())
    }
}

/// 列表查询参数
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProfileQuery {
    /// 模糊搜索（username/bio/skills/profession，仅 ASCII 字母不区分大小写）
    #[serde(default)]
    pub search: Option<String>,
    /// 按职业精确筛选
    #[serde(default)]
    pub profession: Option<String>,
    /// 排序：newest（默认）| oldest | rate-high | rate-low
    #[serde(default)]
    pub sort: Option<String>,
}

/// 列表排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSort {
    Newest,
    Oldest,
    RateHigh,
    RateLow,
    /// 未识别的排序值：按 id 升序
    Unordered,
}

impl ProfileSort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some("newest") => ProfileSort::Newest,
            Some("oldest") => ProfileSort::Oldest,
            Some("rate-high") => ProfileSort::RateHigh,
            Some("rate-low") => ProfileSort::RateLow,
            Some(_) => ProfileSort::Unordered,
        }
    }

    pub fn order_clause(self) -> &'static str {
        match self {
            ProfileSort::Newest => " ORDER BY created_at DESC, id DESC",
            ProfileSort::Oldest => " ORDER BY created_at ASC, id ASC",
            ProfileSort::RateHigh => " ORDER BY hourly_rate DESC, id ASC",
            ProfileSort::RateLow => " ORDER BY hourly_rate ASC, id ASC",
            ProfileSort::Unordered => " ORDER BY id ASC",
        }
    }
}

/// 创建成功响应
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateProfileResponse {
    pub id: i64,
    pub message: String,
    /// 删除口令，仅在创建时返回
    pub delete_code: String,
}

/// 通用消息响应
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
