#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;

use proposal_pdf::snapshot::{
    ProposalRecord, ProposalScreenRecord, ProposalStore, ScreenRecord,
};
use proposal_pdf::{BlobError, BlobStore, StoreError};

pub fn screen(id: i64, city: &str, state: &str, audience: f64) -> ProposalScreenRecord {
    ProposalScreenRecord {
        screen_id: Some(id),
        custom_cpm: None,
        screens: Some(ScreenRecord {
            id: Some(id),
            code: Some(format!("TV-{id:03}")),
            name: Some(format!("Painel {id}")),
            city: Some(city.to_string()),
            state: Some(state.to_string()),
            class: Some("A".to_string()),
            daily_audience: Some(audience),
            venues: None,
        }),
    }
}

pub fn record(id: i64, screens: Vec<ProposalScreenRecord>) -> ProposalRecord {
    ProposalRecord {
        id,
        customer_name: Some("Acme Ltda".to_string()),
        customer_email: Some("contato@acme.com.br".to_string()),
        city: Some("São Paulo".to_string()),
        status: Some("enviada".to_string()),
        created_at: Some(
            chrono::DateTime::parse_from_rfc3339("2026-08-15T12:00:00+00:00")
                .unwrap()
                .with_timezone(&chrono::Utc),
        ),
        cpm_value: Some(30.0),
        proposal_screens: screens,
        ..Default::default()
    }
}

/// In-memory ProposalStore. Serves one record and captures write-backs.
pub struct FakeStore {
    pub record: Option<ProposalRecord>,
    pub fail_link: bool,
    pub linked: Mutex<Vec<(i64, String, Option<String>)>>,
}

impl FakeStore {
    pub fn with(record: ProposalRecord) -> Self {
        Self {
            record: Some(record),
            fail_link: false,
            linked: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self {
            record: None,
            fail_link: false,
            linked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ProposalStore for FakeStore {
    async fn fetch_proposal(&self, id: i64) -> Result<Option<ProposalRecord>, StoreError> {
        Ok(self.record.clone().filter(|r| r.id == id))
    }

    async fn link_artifact(
        &self,
        id: i64,
        path: &str,
        signed_url: Option<&str>,
    ) -> Result<(), StoreError> {
        if self.fail_link {
            return Err(StoreError("update failed (500): boom".to_string()));
        }
        self.linked
            .lock()
            .unwrap()
            .push((id, path.to_string(), signed_url.map(String::from)));
        Ok(())
    }
}

/// In-memory BlobStore. Can simulate a missing bucket that heals on
/// `ensure_bucket`, a bucket create that fails, and a signing outage.
pub struct FakeBlobs {
    pub bucket_exists: Mutex<bool>,
    pub fail_bucket_create: bool,
    pub fail_sign: bool,
    pub uploads: Mutex<Vec<(String, usize)>>,
    pub bucket_creates: Mutex<usize>,
}

impl FakeBlobs {
    pub fn new() -> Self {
        Self {
            bucket_exists: Mutex::new(true),
            fail_bucket_create: false,
            fail_sign: false,
            uploads: Mutex::new(Vec::new()),
            bucket_creates: Mutex::new(0),
        }
    }

    pub fn without_bucket() -> Self {
        let blobs = Self::new();
        *blobs.bucket_exists.lock().unwrap() = false;
        blobs
    }
}

#[async_trait]
impl BlobStore for FakeBlobs {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), BlobError> {
        if !*self.bucket_exists.lock().unwrap() {
            return Err(BlobError::MissingBucket("proposals".to_string()));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), bytes.len()));
        Ok(())
    }

    async fn ensure_bucket(&self) -> Result<(), BlobError> {
        *self.bucket_creates.lock().unwrap() += 1;
        if self.fail_bucket_create {
            return Err(BlobError::Request("bucket create failed (403)".to_string()));
        }
        *self.bucket_exists.lock().unwrap() = true;
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl_secs: i64) -> Result<String, BlobError> {
        if self.fail_sign {
            return Err(BlobError::Request("sign failed (500)".to_string()));
        }
        Ok(format!(
            "https://storage.example/sign/proposals/{path}?exp={ttl_secs}"
        ))
    }
}
