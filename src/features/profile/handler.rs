use axum::{
    Json, Router,
    extract::{
        FromRef, Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    routing::get,
};

use crate::error::{AppError, ErrorBody};

use super::models::{
    CreateProfileResponse, MessageResponse, Profile, ProfileInput, ProfileQuery,
};
use super::storage::{ProfileStorage, USERNAME_TAKEN};

const PROFILE_NOT_FOUND: &str = "Profile not found";
const REQUIRED_FIELDS: &str = "Username and bio are required";

fn parse_body(body: Result<Json<ProfileInput>, JsonRejection>) -> Result<ProfileInput, AppError> {
    body.map(|Json(v)| v).map_err(|e| {
        tracing::debug!(error = %e, "名片请求体解析失败");
        AppError::Validation("Invalid JSON body".to_string())
    })
}

/// 非整数 ID 不可能命中任何记录，按不存在处理
fn parse_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    id.map(|Path(v)| v)
        .map_err(|_| AppError::NotFound(PROFILE_NOT_FOUND.to_string()))
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[utoipa::path(
    get,
    path = "/profiles",
    summary = "名片列表",
    description = "只返回公开名片。search 对 username/bio/skills/profession 做模糊匹配（仅 ASCII 字母不区分大小写），profession 精确筛选，sort 取 newest（默认）/oldest/rate-high/rate-low。",
    params(ProfileQuery),
    responses(
        (status = 200, description = "名片列表", body = [Profile]),
        (status = 500, description = "服务器内部错误", body = ErrorBody)
    ),
    tag = "Profile"
)]
pub async fn list_profiles(
    State(storage): State<ProfileStorage>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<Vec<Profile>>, AppError> {
    let profiles = storage.list_public(&query).await?;
    Ok(Json(profiles))
}

#[utoipa::path(
    get,
    path = "/profiles/{id}",
    summary = "名片详情",
    params(("id" = i64, Path, description = "名片ID")),
    responses(
        (status = 200, description = "名片详情", body = Profile),
        (status = 404, description = "名片不存在", body = ErrorBody),
        (status = 500, description = "服务器内部错误", body = ErrorBody)
    ),
    tag = "Profile"
)]
pub async fn get_profile(
    State(storage): State<ProfileStorage>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Profile>, AppError> {
    let id = parse_id(id)?;
    storage
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(PROFILE_NOT_FOUND.to_string()))
}

#[utoipa::path(
    post,
    path = "/profiles",
    summary = "创建名片",
    description = "username 与 bio 必填，username 不可重复；photo 通常填写 /upload 返回的 url。响应中的 delete_code 只返回这一次。",
    request_body = ProfileInput,
    responses(
        (status = 201, description = "创建成功", body = CreateProfileResponse),
        (status = 400, description = "参数错误", body = ErrorBody),
        (status = 409, description = "用户名已存在", body = ErrorBody),
        (status = 500, description = "服务器内部错误", body = ErrorBody)
    ),
    tag = "Profile"
)]
pub async fn create_profile(
    State(storage): State<ProfileStorage>,
    body: Result<Json<ProfileInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateProfileResponse>), AppError> {
    let input = parse_body(body)?;
    let username = non_blank(input.username.as_deref())
        .ok_or_else(|| AppError::Validation(REQUIRED_FIELDS.to_string()))?;
    if non_blank(input.bio.clone().flatten().as_deref()).is_none() {
        return Err(AppError::Validation(REQUIRED_FIELDS.to_string()));
    }
    if storage.username_exists(&username).await? {
        return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
    }

    let created = storage.create(&username, &input).await?;
    tracing::info!(id = created.id, "名片已创建");

    Ok((
        StatusCode::CREATED,
        Json(CreateProfileResponse {
            id: created.id,
            message: "Profile created successfully".to_string(),
            delete_code: created.delete_code,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/profiles/{id}",
    summary = "更新名片",
    description = "只更新请求体中出现的字段；可空字段传 null 表示清空。改名为已存在的 username 返回 409。",
    params(("id" = i64, Path, description = "名片ID")),
    request_body = ProfileInput,
    responses(
        (status = 200, description = "更新成功", body = MessageResponse),
        (status = 400, description = "参数错误", body = ErrorBody),
        (status = 404, description = "名片不存在", body = ErrorBody),
        (status = 409, description = "用户名已存在", body = ErrorBody),
        (status = 500, description = "服务器内部错误", body = ErrorBody)
    ),
    tag = "Profile"
)]
pub async fn update_profile(
    State(storage): State<ProfileStorage>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<ProfileInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(id)?;
    let mut input = parse_body(body)?;
    if input.username.is_some() {
        input.username = Some(
            non_blank(input.username.as_deref())
                .ok_or_else(|| AppError::Validation("username cannot be blank".to_string()))?,
        );
    }

    // 空请求体不改动 updated_at，只确认记录存在
    let found = if input.is_empty_patch() {
        storage.get(id).await?.is_some()
    } else {
        storage.update(id, &input).await?
    };
    if !found {
        return Err(AppError::NotFound(PROFILE_NOT_FOUND.to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Profile updated successfully".to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/profiles/{id}",
    summary = "删除名片",
    params(("id" = i64, Path, description = "名片ID")),
    responses(
        (status = 200, description = "删除成功", body = MessageResponse),
        (status = 404, description = "名片不存在", body = ErrorBody),
        (status = 500, description = "服务器内部错误", body = ErrorBody)
    ),
    tag = "Profile"
)]
pub async fn delete_profile(
    State(storage): State<ProfileStorage>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(id)?;
    if !storage.delete(id).await? {
        return Err(AppError::NotFound(PROFILE_NOT_FOUND.to_string()));
    }
    tracing::info!(id, "名片已删除");

    Ok(Json(MessageResponse {
        message: "Profile deleted successfully".to_string(),
    }))
}

pub fn create_profile_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ProfileStorage: FromRef<S>,
{
    Router::new()
        .route("/profiles", get(list_profiles).post(create_profile))
        .route(
            "/profiles/:id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
}
