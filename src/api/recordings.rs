use bytes::Bytes;
use serde_json::Value;

use super::messages::CompletedPart;
use crate::upload::error::Result;

/// Remote collaborators an upload session talks to
///
/// Implementations:
/// - `HttpRecordingsApi`: the recordings REST API plus presigned PUTs
/// - In-memory fakes for tests
#[async_trait::async_trait]
pub trait RecordingsApi: Send + Sync {
    /// Open a multipart upload and return its upload identifier
    async fn start_multipart_upload(
        &self,
        filename: &str,
        file_size: u64,
        content_type: &str,
        auth_token: &str,
    ) -> Result<String>;

    /// Issue one destination handle per part
    ///
    /// The number of handles returned decides the part count.
    async fn generate_presigned_urls(
        &self,
        filename: &str,
        upload_id: &str,
        file_size: u64,
        auth_token: &str,
    ) -> Result<Vec<String>>;

    /// PUT one chunk to its destination and return the unquoted confirmation tag
    async fn upload_part(&self, destination: &str, chunk: Bytes, content_type: &str)
        -> Result<String>;

    /// Finalize a multipart upload; `parts` must already be sorted by part number
    async fn complete_multipart_upload(
        &self,
        filename: &str,
        upload_id: &str,
        parts: &[CompletedPart],
        auth_token: &str,
    ) -> Result<Value>;

    /// Single-request upload for artifacts below the multipart threshold
    async fn upload_direct(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
        auth_token: &str,
    ) -> Result<Value>;
}
