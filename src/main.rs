use std::sync::Arc;

use instacard_backend::features::profile::ProfileStorage;
use instacard_backend::features::storage::{ImageKitClient, ImageStore};
use instacard_backend::features::upload::{UploadSettings, UploadState};
use instacard_backend::startup::run_startup_checks;
use instacard_backend::state::AppState;
use instacard_backend::{AppConfig, ShutdownManager, build_router};

fn init_tracing(config: &AppConfig) {
    let level = config.logging.level.trim();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("instacard_backend={level},tower_http={level}").into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.logging.format.as_str() {
        "compact" => builder.compact().init(),
        "pretty" => builder.pretty().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() {
    // Load config
    if let Err(e) = AppConfig::init_global() {
        // 日志尚未初始化
        eprintln!("Config init failed: {e}");
        std::process::exit(1);
    }
    let config = AppConfig::global();
    init_tracing(config);
    tracing::info!("配置文件: {:?}", AppConfig::get_config_path());

    // 创建优雅退出管理器并启动信号处理器
    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    // Run startup checks
    if let Err(e) = run_startup_checks(config) {
        tracing::error!("Startup checks failed: {}", e);
        std::process::exit(1);
    }

    let image_store: Arc<dyn ImageStore> = match ImageKitClient::new(&config.imagekit) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!("ImageKit client init failed: {}", e);
            std::process::exit(1);
        }
    };

    let profiles = match ProfileStorage::connect_sqlite(
        &config.database.sqlite_path,
        config.database.wal,
    )
    .await
    {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("SQLite 初始化失败: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = profiles.init_schema().await {
        tracing::error!("SQLite 建表失败: {}", e);
        std::process::exit(1);
    }
    let pool = profiles.pool.clone();

    let app_state = AppState {
        upload: UploadState::new(
            image_store,
            UploadSettings::from_config(&config.upload, &config.imagekit),
        ),
        profiles,
    };
    let app = build_router(app_state, config);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Upload API: http://{}{}/upload", addr, config.api.prefix);
    tracing::info!("Profile API: http://{}{}/profiles", addr, config.api.prefix);
    tracing::info!("Database: {:?}", config.database_path());

    // 收到退出信号后停止接收新连接，在途请求最多等待 shutdown.timeout_secs
    let shutdown_timeout = config.shutdown.timeout_duration();
    let drain_manager = shutdown_manager.clone();
    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        let reason = shutdown_manager.wait_for_shutdown().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅退出...", reason);
    });

    let result = tokio::select! {
        res = async { serve.await } => res,
        _ = async {
            drain_manager.wait_for_shutdown().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!(
                "优雅退出超时（{}秒），强制退出",
                config.shutdown.timeout_secs
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    pool.close().await;
    tracing::info!("服务器已优雅关闭");
}
