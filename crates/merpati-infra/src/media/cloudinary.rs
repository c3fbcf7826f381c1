//! Cloudinary signed image upload.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use merpati_core::ports::{MediaError, MediaStorage, UploadRequest};

/// Cloudinary account and upload settings.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub timeout: Duration,
    pub api_base_url: String,
}

impl CloudinaryConfig {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            folder: "article-project".to_string(),
            timeout: Duration::from_secs(10),
            api_base_url: "https://api.cloudinary.com/v1_1".to_string(),
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.api_base_url.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    message: String,
}

/// Build the string Cloudinary signs: `k=v` pairs sorted by key, joined with
/// `&`, followed by the API secret.
fn string_to_sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{joined}{api_secret}")
}

fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let digest = Sha256::digest(string_to_sign(params, api_secret).as_bytes());
    hex::encode(digest)
}

/// Uploads images to Cloudinary. The reqwest client (and its timeout) is
/// built once and shared.
pub struct CloudinaryStorage {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryStorage {
    pub fn new(config: CloudinaryConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MediaError::Request(e.to_string()))?;

        tracing::info!(
            cloud = %config.cloud_name,
            folder = %config.folder,
            timeout_secs = config.timeout.as_secs(),
            "Cloudinary storage initialized"
        );

        Ok(Self { client, config })
    }
}

#[async_trait]
impl MediaStorage for CloudinaryStorage {
    async fn upload(&self, request: UploadRequest) -> Result<String, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signed = [
            ("folder", self.config.folder.clone()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = sign(&signed, &self.config.api_secret);

        let mut part = Part::bytes(request.bytes).file_name(request.file_name.clone());
        if let Some(content_type) = &request.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| MediaError::Request(e.to_string()))?;
        }

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("folder", self.config.folder.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        tracing::debug!(file = %request.file_name, "Uploading image to Cloudinary");

        let response = self
            .client
            .post(self.config.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MediaError::Timeout
                } else {
                    MediaError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                message: body
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        body.secure_url
            .ok_or_else(|| MediaError::InvalidResponse("missing secure_url".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve one canned HTTP response and return the base URL to reach it.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}")
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let headers = text[..header_end].to_ascii_lowercase();
        let content_length = headers.lines().find_map(|line| {
            line.strip_prefix("content-length:")
                .and_then(|v| v.trim().parse::<usize>().ok())
        });
        match content_length {
            Some(len) => raw.len() >= header_end + 4 + len,
            None => text.ends_with("0\r\n\r\n"),
        }
    }

    fn storage_at(base_url: String) -> CloudinaryStorage {
        let mut config = CloudinaryConfig::new("demo", "key", "secret");
        config.api_base_url = base_url;
        CloudinaryStorage::new(config).unwrap()
    }

    fn image() -> UploadRequest {
        UploadRequest {
            file_name: "cover.png".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url() {
        let base = serve_once(
            "200 OK",
            r#"{"secure_url":"https://res.cloudinary.com/demo/image/upload/cover.png"}"#,
        )
        .await;

        let url = storage_at(base).upload(image()).await.unwrap();

        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/cover.png");
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected_with_provider_message() {
        let base = serve_once(
            "401 Unauthorized",
            r#"{"error":{"message":"Invalid Signature"}}"#,
        )
        .await;

        let result = storage_at(base).upload(image()).await;

        match result {
            Err(MediaError::Rejected { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_without_secure_url_is_invalid() {
        let base = serve_once("200 OK", r#"{"public_id":"cover"}"#).await;

        let result = storage_at(base).upload(image()).await;

        assert!(matches!(result, Err(MediaError::InvalidResponse(_))));
    }

    #[test]
    fn test_string_to_sign_sorts_params() {
        let params = [
            ("timestamp", "1315060510".to_string()),
            ("folder", "article-project".to_string()),
        ];

        assert_eq!(
            string_to_sign(&params, "secret"),
            "folder=article-project&timestamp=1315060510secret"
        );
    }

    #[test]
    fn test_signature_is_hex_sha256_and_secret_dependent() {
        let params = [("timestamp", "1".to_string())];

        let a = sign(&params, "secret-a");
        let b = sign(&params, "secret-b");

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_upload_url() {
        let mut config = CloudinaryConfig::new("demo", "key", "secret");
        assert_eq!(
            config.upload_url(),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );

        config.api_base_url = "http://localhost:9000/".to_string();
        assert_eq!(config.upload_url(), "http://localhost:9000/demo/image/upload");
    }
}
