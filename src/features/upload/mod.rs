pub mod handler;
pub mod models;
pub mod multipart;

pub use handler::{UploadState, create_upload_router};
pub use models::{BufferedFile, UploadResponse, UploadSettings};
