use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（未设置 RUST_LOG 时生效）
    pub level: String,
    /// 日志格式：full | compact | pretty
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "full".to_string(),
        }
    }
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API 路由前缀
    pub prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
        }
    }
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default = "CorsConfig::default_enabled")]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// 允许的方法列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_methods: Vec<String>,
    /// 允许的请求头列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_headers: Vec<String>,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl CorsConfig {
    fn default_enabled() -> bool {
        false
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            allowed_origins: Vec::new(),
            allowed_methods: Vec::new(),
            allowed_headers: Vec::new(),
            max_age_secs: None,
        }
    }
}

/// ImageKit 图床配置
#[derive(Clone, Serialize, Deserialize)]
pub struct ImageKitConfig {
    /// 私钥（上传接口的 Basic Auth 用户名）
    #[serde(default)]
    pub private_key: String,
    /// 上传接口地址
    #[serde(default = "ImageKitConfig::default_upload_endpoint")]
    pub upload_endpoint: String,
    /// 固定的目标目录，不从请求中推导
    #[serde(default = "ImageKitConfig::default_folder")]
    pub folder: String,
    /// 是否让 ImageKit 为同名文件追加随机后缀
    #[serde(default = "ImageKitConfig::default_use_unique_file_name")]
    pub use_unique_file_name: bool,
    /// 单次上传的超时时间（秒）
    #[serde(default = "ImageKitConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ImageKitConfig {
    fn default_upload_endpoint() -> String {
        "https://upload.imagekit.io/api/v1/files/upload".to_string()
    }
    fn default_folder() -> String {
        "/instacard-profiles".to_string()
    }
    fn default_use_unique_file_name() -> bool {
        true
    }
    fn default_timeout() -> u64 {
        30
    }

    /// 获取上传超时时间
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for ImageKitConfig {
    fn default() -> Self {
        Self {
            private_key: String::new(),
            upload_endpoint: Self::default_upload_endpoint(),
            folder: Self::default_folder(),
            use_unique_file_name: Self::default_use_unique_file_name(),
            timeout_secs: Self::default_timeout(),
        }
    }
}

// 私钥不进日志
impl std::fmt::Debug for ImageKitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageKitConfig")
            .field("private_key", &"<redacted>")
            .field("upload_endpoint", &self.upload_endpoint)
            .field("folder", &self.folder)
            .field("use_unique_file_name", &self.use_unique_file_name)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// 上传入口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// multipart 中承载文件的字段名
    #[serde(default = "UploadConfig::default_field_name")]
    pub field_name: String,
    /// 请求体上限（字节），交给 axum 的 DefaultBodyLimit 处理
    #[serde(default = "UploadConfig::default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl UploadConfig {
    fn default_field_name() -> String {
        "image".to_string()
    }
    fn default_max_body_bytes() -> usize {
        10 * 1024 * 1024
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            field_name: Self::default_field_name(),
            max_body_bytes: Self::default_max_body_bytes(),
        }
    }
}

/// 名片数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite 文件路径
    #[serde(default = "DatabaseConfig::default_sqlite_path")]
    pub sqlite_path: String,
    /// 是否启用 WAL
    #[serde(default = "DatabaseConfig::default_wal")]
    pub wal: bool,
}

impl DatabaseConfig {
    fn default_sqlite_path() -> String {
        "./data/instacard.db".to_string()
    }
    fn default_wal() -> bool {
        true
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: Self::default_sqlite_path(),
            wal: Self::default_wal(),
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// CORS 配置
    #[serde(default)]
    pub cors: CorsConfig,
    /// ImageKit 图床配置
    #[serde(default)]
    pub imagekit: ImageKitConfig,
    /// 上传入口配置
    #[serde(default)]
    pub upload: UploadConfig,
    /// 名片数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 优雅退出配置
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从配置文件加载配置，支持环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        tracing::info!("正在从 {:?} 加载配置文件", config_path);

        let builder = ConfigBuilder::builder()
            // 配置文件可缺省，缺省时全部字段走默认值
            .add_source(File::from(config_path).required(false))
            // 支持环境变量覆盖，例如：APP_IMAGEKIT__PRIVATE_KEY
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = builder.try_deserialize()?;

        tracing::debug!("配置加载完成: imagekit = {:?}", config.imagekit);

        Ok(config)
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 init_global()")
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    /// 获取配置文件路径（可用 APP_CONFIG 指定）
    pub fn get_config_path() -> PathBuf {
        std::env::var("APP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取 SQLite 文件路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.database.sqlite_path)
    }
}
