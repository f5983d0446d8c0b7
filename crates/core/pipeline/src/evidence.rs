//! Evidence object store behind a narrow trait so the orchestrator
//! can be exercised without S3.

use floodnet_result::Result;

#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Store an evidence image, returning its public reference
    async fn upload(&self, buf: &[u8], content_type: &str) -> Result<String>;

    /// Remove a stored evidence image by its public reference
    async fn delete(&self, reference: &str) -> Result<()>;
}

/// Production store backed by the configured S3 bucket
#[derive(Default)]
pub struct S3EvidenceStore;

#[async_trait]
impl EvidenceStore for S3EvidenceStore {
    async fn upload(&self, buf: &[u8], content_type: &str) -> Result<String> {
        floodnet_files::upload_to_s3(buf, content_type).await
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        let key = floodnet_files::key_from_reference(reference)?;
        floodnet_files::delete_from_s3(&key).await
    }
}
