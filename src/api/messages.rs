use serde::{Deserialize, Serialize};

/// Body of `POST /recordings/start-multipart-upload`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMultipartRequest {
    pub file_name: String,
    pub file_size: u64,
    pub content_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMultipartResponse {
    pub upload_id: String,
}

/// Body of `POST /recordings/generate-presigned-url`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlsRequest {
    pub file_name: String,
    pub upload_id: String,
    pub file_size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlsResponse {
    /// One destination per part, in part order
    #[serde(default)]
    pub presigned_urls: Vec<String>,
}

/// One confirmed part as the completion endpoint expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    #[serde(rename = "PartNumber")]
    pub part_number: u32,
    pub etag: String,
}

/// Body of `POST /recordings/complete-multipart-upload`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMultipartRequest {
    pub file_name: String,
    pub upload_id: String,
    pub parts: Vec<CompletedPart>,
}
