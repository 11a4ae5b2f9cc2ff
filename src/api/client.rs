//! Recordings API client
//!
//! JSON calls go to `{base_url}/recordings/*` with a bearer token; part
//! uploads are raw PUTs against presigned destinations.

use bytes::Bytes;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};

use super::messages::{
    CompleteMultipartRequest, CompletedPart, PresignedUrlsRequest, PresignedUrlsResponse,
    StartMultipartRequest, StartMultipartResponse,
};
use super::recordings::RecordingsApi;
use crate::upload::error::{Result, UploadError};

/// Per-call timeouts for the recordings API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiTimeouts {
    /// One part PUT
    pub part: Duration,
    /// Start-upload and presign calls
    pub metadata: Duration,
    /// Complete-upload call
    pub completion: Duration,
    /// Whole-file direct upload
    pub direct: Duration,
}

impl Default for ApiTimeouts {
    fn default() -> Self {
        Self {
            part: Duration::from_secs(300),
            metadata: Duration::from_secs(30),
            completion: Duration::from_secs(60),
            direct: Duration::from_secs(120),
        }
    }
}

/// `RecordingsApi` over HTTP using reqwest
pub struct HttpRecordingsApi {
    client: Client,
    base_url: String,
    timeouts: ApiTimeouts,
}

impl HttpRecordingsApi {
    pub fn new(base_url: impl Into<String>, timeouts: ApiTimeouts) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| UploadError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Recordings API at {}", base_url);

        Ok(Self {
            client,
            base_url,
            timeouts,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/recordings/{}", self.base_url, path)
    }

    fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        auth_token: &str,
        timeout: Duration,
    ) -> RequestBuilder {
        self.client
            .post(self.endpoint(path))
            .bearer_auth(auth_token)
            .timeout(timeout)
            .json(body)
    }
}

#[async_trait::async_trait]
impl RecordingsApi for HttpRecordingsApi {
    async fn start_multipart_upload(
        &self,
        filename: &str,
        file_size: u64,
        content_type: &str,
        auth_token: &str,
    ) -> Result<String> {
        let auth_token = require_token(auth_token)?;
        let request = StartMultipartRequest {
            file_name: filename.to_string(),
            file_size,
            content_type: content_type.to_string(),
        };

        let resp = send(
            self.post_json(
                "start-multipart-upload",
                &request,
                auth_token,
                self.timeouts.metadata,
            ),
            "Start multipart upload",
        )
        .await?;
        let resp = check_status(resp, "Failed to start multipart upload").await?;
        let body: StartMultipartResponse = parse_json(resp).await?;

        info!("Multipart upload started for {}: {}", filename, body.upload_id);
        Ok(body.upload_id)
    }

    async fn generate_presigned_urls(
        &self,
        filename: &str,
        upload_id: &str,
        file_size: u64,
        auth_token: &str,
    ) -> Result<Vec<String>> {
        let auth_token = require_token(auth_token)?;
        let request = PresignedUrlsRequest {
            file_name: filename.to_string(),
            upload_id: upload_id.to_string(),
            file_size,
        };

        let resp = send(
            self.post_json(
                "generate-presigned-url",
                &request,
                auth_token,
                self.timeouts.metadata,
            ),
            "Generate presigned URLs",
        )
        .await?;
        let resp = check_status(resp, "Failed to generate presigned URLs").await?;
        let body: PresignedUrlsResponse = parse_json(resp).await?;

        info!("Presigned URLs generated: {}", body.presigned_urls.len());
        Ok(body.presigned_urls)
    }

    async fn upload_part(
        &self,
        destination: &str,
        chunk: Bytes,
        content_type: &str,
    ) -> Result<String> {
        let size = chunk.len();

        let resp = self
            .client
            .put(destination)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .timeout(self.timeouts.part)
            .body(chunk)
            .send()
            .await
            .map_err(|e| UploadError::Transport {
                message: format!("Part upload failed: {}", e),
            })?;

        if !resp.status().is_success() {
            return Err(UploadError::Protocol {
                message: format!("Part upload failed: {}", resp.status()),
            });
        }

        let etag = resp
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(unquote_etag)
            .filter(|tag| !tag.is_empty())
            .ok_or_else(|| UploadError::Protocol {
                message: "Missing ETag in response".into(),
            })?;

        debug!("Part PUT complete ({} bytes), etag={}", size, etag);
        Ok(etag)
    }

    async fn complete_multipart_upload(
        &self,
        filename: &str,
        upload_id: &str,
        parts: &[CompletedPart],
        auth_token: &str,
    ) -> Result<Value> {
        let auth_token = require_token(auth_token)?;
        let request = CompleteMultipartRequest {
            file_name: filename.to_string(),
            upload_id: upload_id.to_string(),
            parts: parts.to_vec(),
        };

        let resp = send(
            self.post_json(
                "complete-multipart-upload",
                &request,
                auth_token,
                self.timeouts.completion,
            ),
            "Complete multipart upload",
        )
        .await?;
        let resp = check_status(resp, "Failed to complete multipart upload").await?;

        let body = json_or(resp, "Upload completed successfully").await;
        info!("Multipart upload completed: {}", body);
        Ok(body)
    }

    async fn upload_direct(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
        auth_token: &str,
    ) -> Result<Value> {
        let auth_token = require_token(auth_token)?;
        let size = data.len() as u64;

        let part = multipart::Part::stream_with_length(data, size)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| UploadError::Internal {
                message: format!("Invalid content type {}: {}", content_type, e),
            })?;
        let form = multipart::Form::new().part("file", part);

        info!("Sending direct upload: {} ({} bytes)", filename, size);

        let resp = send(
            self.client
                .post(self.endpoint("upload"))
                .bearer_auth(auth_token)
                .timeout(self.timeouts.direct)
                .multipart(form),
            "Upload",
        )
        .await?;

        if resp.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Err(UploadError::PayloadTooLarge { size });
        }
        let resp = check_status(resp, "Upload failed").await?;

        let body = json_or(resp, "Upload successful").await;
        info!("Upload successful: {}", body);
        Ok(body)
    }
}

/// Strip quoting characters from an ETag header value
pub fn unquote_etag(raw: &str) -> String {
    raw.replace('"', "")
}

fn require_token(auth_token: &str) -> Result<&str> {
    let token = auth_token.trim();
    if token.is_empty() || token == "null" || token == "undefined" {
        return Err(UploadError::Unauthorized {
            message: "No authentication token available. Please login first.".into(),
        });
    }
    Ok(token)
}

async fn send(request: RequestBuilder, what: &str) -> Result<Response> {
    request.send().await.map_err(|e| {
        error!("{} error: {}", what, e);
        UploadError::Transport {
            message: format!("{} request failed: {}", what, e),
        }
    })
}

async fn check_status(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(UploadError::Unauthorized {
            message: "Invalid or expired token.".into(),
        });
    }

    let body = resp.text().await.unwrap_or_default();
    Err(UploadError::Service {
        status: Some(status.as_u16()),
        message: if body.is_empty() {
            format!("{}: {}", what, status)
        } else {
            format!("{}: {} - {}", what, status, body)
        },
    })
}

async fn parse_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status().as_u16();
    let text = resp.text().await.map_err(|e| UploadError::Transport {
        message: format!("Failed to read response body: {}", e),
    })?;

    serde_json::from_str(&text).map_err(|e| UploadError::Service {
        status: Some(status),
        message: format!("Invalid response format: {}", e),
    })
}

/// Parse a success body as JSON, falling back to a plain message
async fn json_or(resp: Response, fallback_message: &str) -> Value {
    match resp.text().await {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|_| json!({ "message": fallback_message })),
        Err(_) => json!({ "message": fallback_message }),
    }
}
