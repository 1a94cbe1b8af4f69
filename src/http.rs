use reqwest::Client;
use std::time::Duration;

/// 建连超时，与整体超时分开计算，避免 DNS/握手卡死占满整个上传窗口。
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// 构建图床上传使用的 HTTP Client。
///
/// `Client` 内部自带连接池且线程安全，进程内只需构建一次，由所有请求共享。
pub fn build_upload_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("instacard-backend/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .build()
}
