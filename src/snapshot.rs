use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{Error, StoreError};
use crate::model::{
    DEFAULT_CPM, IMPRESSION_UNIT_THOUSANDS, LineItem, ProposalHeader, ProposalStatus, Snapshot,
};

/// Placeholder for absent display fields, matching the dashboard's rendering
/// of missing values.
const MISSING: &str = "—";

/// Read/write seam against the relational store holding proposals.
///
/// `fetch_proposal` is one logical read: the proposal row with its line
/// items and nested screen/venue metadata. `link_artifact` writes the
/// storage pointer back onto the proposal after a successful upload.
#[async_trait]
pub trait ProposalStore: Send + Sync {
    async fn fetch_proposal(&self, id: i64) -> Result<Option<ProposalRecord>, StoreError>;

    async fn link_artifact(
        &self,
        id: i64,
        path: &str,
        signed_url: Option<&str>,
    ) -> Result<(), StoreError>;
}

// Row shapes as the PostgREST embed returns them. Every nested field is
// optional; normalization to defaults happens once, in `load`.

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProposalRecord {
    pub id: i64,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub city: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub insertions_per_hour: Option<u32>,
    pub film_seconds: Option<u32>,
    pub cpm_mode: Option<String>,
    pub cpm_value: Option<f64>,
    pub discount_pct: Option<f64>,
    pub discount_fixed: Option<f64>,
    #[serde(default)]
    pub agencias: Option<AgencyRecord>,
    #[serde(default)]
    pub agencia_projetos: Option<ProjectRecord>,
    #[serde(default)]
    pub proposal_screens: Vec<ProposalScreenRecord>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AgencyRecord {
    pub nome_agencia: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectRecord {
    pub nome_projeto: Option<String>,
    pub cliente_final: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProposalScreenRecord {
    pub screen_id: Option<i64>,
    pub custom_cpm: Option<f64>,
    #[serde(default)]
    pub screens: Option<ScreenRecord>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScreenRecord {
    pub id: Option<i64>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub class: Option<String>,
    pub daily_audience: Option<f64>,
    #[serde(default)]
    pub venues: Option<VenueRecord>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VenueRecord {
    pub name: Option<String>,
}

/// Fetch the proposal and build the immutable snapshot.
///
/// Fails with `NotFound` when the id does not resolve and `DataFetch` when
/// the read itself errors; neither is retried here. On success every
/// optional field has been resolved, so rendering never branches on
/// presence again.
pub async fn load(store: &dyn ProposalStore, id: i64) -> Result<Snapshot, Error> {
    let record = store
        .fetch_proposal(id)
        .await
        .map_err(|source| Error::DataFetch { id, source })?
        .ok_or(Error::NotFound(id))?;
    Ok(build(record))
}

/// Normalize a raw record into a snapshot. Pure; separated from `load` so
/// tests can exercise defaulting without a store.
pub fn build(record: ProposalRecord) -> Snapshot {
    let cpm_value = record.cpm_value.unwrap_or(0.0).max(0.0);

    let project = record.agencia_projetos.unwrap_or_default();
    let customer_name = non_empty(record.customer_name);

    let header = ProposalHeader {
        id: record.id,
        customer_name: customer_name.clone().unwrap_or_else(|| MISSING.into()),
        customer_email: non_empty(record.customer_email).unwrap_or_else(|| MISSING.into()),
        city: non_empty(record.city).unwrap_or_else(|| MISSING.into()),
        created_at: record.created_at.unwrap_or_else(Utc::now),
        status: ProposalStatus::parse(record.status.as_deref().unwrap_or("rascunho")),
        discount_pct: record.discount_pct.unwrap_or(0.0).max(0.0),
        discount_fixed: record.discount_fixed.unwrap_or(0.0).max(0.0),
        cpm_mode: record.cpm_mode.unwrap_or_else(|| "manual".into()),
        cpm_value,
        insertions_per_hour: record.insertions_per_hour.unwrap_or(0),
        film_seconds: record.film_seconds.unwrap_or(0),
        start_date: record.start_date,
        end_date: record.end_date,
        agency_name: record
            .agencias
            .and_then(|a| non_empty(a.nome_agencia))
            .unwrap_or_else(|| MISSING.into()),
        project_name: non_empty(project.nome_projeto).unwrap_or_else(|| MISSING.into()),
        final_client: non_empty(project.cliente_final)
            .or(customer_name)
            .unwrap_or_else(|| MISSING.into()),
    };

    let items = record
        .proposal_screens
        .into_iter()
        .map(|ps| {
            let screen = ps.screens.unwrap_or_default();
            let screen_id = ps.screen_id.or(screen.id).unwrap_or(0);
            let custom_cpm = ps.custom_cpm.filter(|&c| c > 0.0);

            // custom override -> header value -> hardcoded floor
            let effective_cpm = custom_cpm
                .or(Some(cpm_value).filter(|&c| c > 0.0))
                .unwrap_or(DEFAULT_CPM);

            LineItem {
                screen_id,
                code: non_empty(screen.code).unwrap_or_else(|| format!("SCR-{screen_id}")),
                name: non_empty(screen.name)
                    .or_else(|| screen.venues.and_then(|v| non_empty(v.name)))
                    .unwrap_or_else(|| format!("Tela {screen_id}")),
                city: non_empty(screen.city).unwrap_or_else(|| MISSING.into()),
                state: non_empty(screen.state).unwrap_or_else(|| MISSING.into()),
                class: non_empty(screen.class).unwrap_or_else(|| "ND".into()),
                daily_audience: screen.daily_audience.unwrap_or(0.0).max(0.0),
                custom_cpm,
                effective_cpm,
                screen_value: effective_cpm * IMPRESSION_UNIT_THOUSANDS,
            }
        })
        .collect();

    Snapshot { header, items }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// PostgREST-backed store. One nested-embed select per fetch, matching the
/// dashboard's own query shape.
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

const PROPOSAL_SELECT: &str = "*,agencias(nome_agencia),agencia_projetos(nome_projeto,cliente_final),\
proposal_screens(screen_id,custom_cpm,screens(id,code,name,city,state,class,daily_audience,venues(name)))";

impl SupabaseStore {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            service_key: service_key.into(),
        }
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            service_key: service_key.into(),
        }
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

#[async_trait]
impl ProposalStore for SupabaseStore {
    async fn fetch_proposal(&self, id: i64) -> Result<Option<ProposalRecord>, StoreError> {
        let url = format!("{}/rest/v1/proposals", self.base_url);
        let response = self
            .auth(self.client.get(&url))
            .query(&[("id", format!("eq.{id}")), ("select", PROPOSAL_SELECT.into())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError(format!("proposal select failed ({status}): {body}")));
        }

        let mut rows: Vec<ProposalRecord> = response.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn link_artifact(
        &self,
        id: i64,
        path: &str,
        signed_url: Option<&str>,
    ) -> Result<(), StoreError> {
        let url = format!("{}/rest/v1/proposals", self.base_url);
        let response = self
            .auth(self.client.patch(&url))
            .query(&[("id", format!("eq.{id}"))])
            .json(&serde_json::json!({ "pdf_path": path, "pdf_url": signed_url }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError(format!("proposal update failed ({status}): {body}")));
        }
        Ok(())
    }
}
