use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::{BlobError, Error};
use crate::snapshot::ProposalStore;

/// Bucket holding generated documents.
pub const BUCKET: &str = "proposals";

/// Signed download links stay valid for 30 days.
pub const SIGNED_URL_TTL_SECS: i64 = 60 * 60 * 24 * 30;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Deterministic object path for a proposal's document. Regenerating a
/// proposal overwrites the previous artifact instead of accumulating copies.
pub fn artifact_path(proposal_id: i64) -> String {
    format!("pdf/proposal_{proposal_id}.pdf")
}

/// Write seam against blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), BlobError>;

    /// Create the bucket. Called once when an upload reports it missing.
    async fn ensure_bucket(&self) -> Result<(), BlobError>;

    async fn signed_url(&self, path: &str, ttl_secs: i64) -> Result<String, BlobError>;
}

/// Outcome of a successful publish. `signed_url` is None when signing
/// failed after a successful upload; the artifact is still stored and
/// linked by path.
#[derive(Clone, Debug)]
pub struct Publication {
    pub path: String,
    pub signed_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Upload the encoded document, mint a signed URL, and write the artifact
/// pointer back onto the proposal row.
///
/// A missing bucket is self-healed once: create it and retry the upload.
/// Signing failures degrade to a null URL rather than failing the publish.
/// A write-back failure is reported as `Publish` and names the path, since
/// at that point the blob already exists.
pub async fn publish(
    store: &dyn ProposalStore,
    blobs: &dyn BlobStore,
    proposal_id: i64,
    bytes: &[u8],
) -> Result<Publication, Error> {
    let path = artifact_path(proposal_id);

    let upload = blobs.upload(&path, bytes, PDF_CONTENT_TYPE).await;
    if let Err(err) = upload {
        match err {
            BlobError::MissingBucket(_) => {
                log::info!("bucket {BUCKET} missing, creating it");
                blobs
                    .ensure_bucket()
                    .await
                    .map_err(|source| Error::Storage { id: proposal_id, source })?;
                blobs
                    .upload(&path, bytes, PDF_CONTENT_TYPE)
                    .await
                    .map_err(|source| Error::Storage { id: proposal_id, source })?;
            }
            source => return Err(Error::Storage { id: proposal_id, source }),
        }
    }

    let (signed_url, expires_at) = match blobs.signed_url(&path, SIGNED_URL_TTL_SECS).await {
        Ok(url) => (Some(url), Some(Utc::now() + Duration::seconds(SIGNED_URL_TTL_SECS))),
        Err(e) => {
            log::warn!("signed URL for {path} failed: {e}; linking by path only");
            (None, None)
        }
    };

    store
        .link_artifact(proposal_id, &path, signed_url.as_deref())
        .await
        .map_err(|source| Error::Publish {
            id: proposal_id,
            path: path.clone(),
            source,
        })?;

    Ok(Publication {
        path,
        signed_url,
        expires_at,
    })
}

/// Supabase Storage REST client.
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self::with_bucket(base_url, service_key, BUCKET)
    }

    pub fn with_bucket(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            service_key: service_key.into(),
            bucket: bucket.into(),
        }
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

#[async_trait]
impl BlobStore for SupabaseStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), BlobError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let response = self
            .auth(self.client.post(&url))
            .header("content-type", content_type)
            .header("x-upsert", "true")
            .body(bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::NOT_FOUND && body.contains("Bucket not found") {
            return Err(BlobError::MissingBucket(self.bucket.clone()));
        }
        Err(BlobError::Request(format!(
            "upload of {path} failed ({status}): {body}"
        )))
    }

    async fn ensure_bucket(&self) -> Result<(), BlobError> {
        let url = format!("{}/storage/v1/bucket", self.base_url);
        let response = self
            .auth(self.client.post(&url))
            .json(&serde_json::json!({ "id": self.bucket, "name": self.bucket }))
            .send()
            .await?;

        let status = response.status();
        // 409 means another writer created it first; that is fine.
        if status.is_success() || status == reqwest::StatusCode::CONFLICT {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(BlobError::Request(format!(
            "bucket create failed ({status}): {body}"
        )))
    }

    async fn signed_url(&self, path: &str, ttl_secs: i64) -> Result<String, BlobError> {
        let url = format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url, self.bucket, path
        );
        let response = self
            .auth(self.client.post(&url))
            .json(&serde_json::json!({ "expiresIn": ttl_secs }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BlobError::Request(format!(
                "sign of {path} failed ({status}): {body}"
            )));
        }

        #[derive(serde::Deserialize)]
        struct SignResponse {
            #[serde(rename = "signedURL")]
            signed_url: String,
        }
        let signed: SignResponse = response.json().await?;
        // The endpoint returns a path relative to /storage/v1.
        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }
}
