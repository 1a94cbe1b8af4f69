/// 健康检查
pub mod health;
/// 名片（Profile）增删改查
pub mod profile;
/// 外部图床客户端
pub mod storage;
/// 头像上传入口
pub mod upload;
