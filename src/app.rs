use axum::Router;
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::cors::build_cors_layer;
use crate::features::{
    health::create_health_router, profile::create_profile_router, upload::create_upload_router,
};
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // 只压缩 JSON/文本；图片与二进制本身已压缩，SSE 压缩会引入缓冲
    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

/// 组装完整路由：业务接口挂在 `config.api.prefix` 下，根路径保留 `/health` 与文档。
pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let api_router = Router::<AppState>::new()
        .merge(create_health_router())
        .merge(create_upload_router(&state.upload.settings))
        .merge(create_profile_router());

    let mut app = Router::<AppState>::new()
        .merge(create_health_router())
        .nest(&config.api.prefix, api_router)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state);

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    app.layer(CompressionLayer::new().compress_when(compression_predicate()))
        // 最外层：让上面所有层的日志都落在 request span 里
        .layer(axum::middleware::from_fn(request_id_middleware))
}
