use axum::extract::FromRef;

use crate::features::profile::ProfileStorage;
use crate::features::upload::UploadState;

/// 聚合的应用共享状态，各功能路由通过 `FromRef` 取自己需要的部分
#[derive(Clone)]
pub struct AppState {
    pub upload: UploadState,
    pub profiles: ProfileStorage,
}

impl FromRef<AppState> for UploadState {
    fn from_ref(state: &AppState) -> Self {
        state.upload.clone()
    }
}

impl FromRef<AppState> for ProfileStorage {
    fn from_ref(state: &AppState) -> Self {
        state.profiles.clone()
    }
}
