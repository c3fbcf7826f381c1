//! Media storage port - abstraction over hosted image storage.

use async_trait::async_trait;

/// A file to be uploaded.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Media storage trait - uploads a file and returns its public URL.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<String, MediaError>;
}

/// Media storage errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("upload request failed: {0}")]
    Request(String),

    #[error("upload timed out")]
    Timeout,

    #[error("media host rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected media host response: {0}")]
    InvalidResponse(String),
}
