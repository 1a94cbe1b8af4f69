pub mod handler;
pub mod models;
pub mod storage;

pub use handler::create_profile_router;
pub use storage::ProfileStorage;
