use crate::config::AppConfig;
use crate::error::AppError;

/// 执行启动检查
///
/// 1. ImageKit 私钥必须已配置（否则每次上传都会失败）
/// 2. 上传地址必须是绝对 http(s) URL
/// 3. 上传字段名与目标目录不能为空
pub fn run_startup_checks(config: &AppConfig) -> Result<(), AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    check_imagekit(config)?;
    check_upload(config)?;

    tracing::info!("✅ 启动检查完成");
    Ok(())
}

fn check_imagekit(config: &AppConfig) -> Result<(), AppError> {
    let ik = &config.imagekit;
    if ik.private_key.trim().is_empty() {
        return Err(AppError::Validation(
            "imagekit.private_key 未配置（可通过 APP_IMAGEKIT__PRIVATE_KEY 设置）".to_string(),
        ));
    }

    let endpoint = ik.upload_endpoint.trim();
    let scheme_ok = endpoint.starts_with("https://") || endpoint.starts_with("http://");
    let has_host = endpoint
        .split_once("://")
        .is_some_and(|(_, rest)| !rest.is_empty() && !rest.starts_with('/'));
    if !scheme_ok || !has_host {
        return Err(AppError::Validation(format!(
            "imagekit.upload_endpoint 不是合法的 http(s) 地址: {endpoint}"
        )));
    }
    if endpoint.starts_with("http://") {
        tracing::warn!("⚠️ imagekit.upload_endpoint 使用明文 http，私钥将以明文传输");
    }

    tracing::info!(
        "✅ ImageKit 配置: endpoint={}, folder={}",
        endpoint,
        ik.folder
    );
    Ok(())
}

fn check_upload(config: &AppConfig) -> Result<(), AppError> {
    if config.upload.field_name.trim().is_empty() {
        return Err(AppError::Validation("upload.field_name 不能为空".to_string()));
    }
    if config.imagekit.folder.trim().is_empty() {
        return Err(AppError::Validation("imagekit.folder 不能为空".to_string()));
    }
    if config.upload.max_body_bytes == 0 {
        tracing::warn!("⚠️ upload.max_body_bytes = 0，所有上传都会被视为未上传文件");
    }
    Ok(())
}
