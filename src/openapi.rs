use utoipa::OpenApi;
use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};

/// 为 Swagger UI 提供正确的“业务接口前缀”Servers 配置。
///
/// - 业务接口默认前缀为 `/api`（对应 `config.api.prefix` / `APP_API__PREFIX`）。
/// - `/health` 在根路径也有一份，因此额外提供 `/` 作为备用 server。
struct ApiServers;

impl utoipa::Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口（默认 /api）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api")
                    .description(Some(
                        "业务接口前缀：对应 config.api.prefix（可通过 APP_API__PREFIX 覆盖）",
                    )),
            )
            .build();

        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（仅 /health）"))
            .build();

        openapi.servers = Some(vec![api, root]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::upload::handler::upload_image,
        crate::features::profile::handler::list_profiles,
        crate::features::profile::handler::get_profile,
        crate::features::profile::handler::create_profile,
        crate::features::profile::handler::update_profile,
        crate::features::profile::handler::delete_profile,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::features::health::handler::HealthResponse,
        crate::features::upload::models::UploadResponse,
        crate::features::upload::models::UploadForm,
        crate::features::profile::models::Profile,
        crate::features::profile::models::ProfileInput,
        crate::features::profile::models::CreateProfileResponse,
        crate::features::profile::models::MessageResponse,
    )),
    modifiers(&ApiServers),
    tags(
        (name = "Upload", description = "头像上传：转存到 ImageKit 并返回公开地址。"),
        (name = "Profile", description = "名片：增删改查与公开列表。"),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "InstaCard Backend API",
        version = env!("CARGO_PKG_VERSION"),
        description = "InstaCard 后端 API（Axum + utoipa）。除根路径 /health 外，业务接口挂载在 `config.api.prefix`（默认 /api）下，OpenAPI 的 paths 不包含该前缀。"
    )
)]
pub struct ApiDoc;
