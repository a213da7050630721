mod error;
mod fonts;

pub mod finance;
pub mod model;
pub mod pdf;
pub mod snapshot;
pub mod storage;

pub use error::{BlobError, Error, ErrorKind, StoreError};
pub use pdf::{Logo, LogoFormat};
pub use snapshot::{ProposalStore, SupabaseStore};
pub use storage::{BlobStore, Publication, SupabaseStorage};

use std::time::Instant;

/// Generate and publish the document for one proposal: fetch the snapshot,
/// derive the metrics, paginate, encode, upload, and link the artifact back
/// onto the proposal row. Returns where the artifact landed.
///
/// The logo is best-effort: a fetch or decode failure logs a warning and
/// the document renders without it.
pub async fn generate(
    store: &dyn ProposalStore,
    blobs: &dyn BlobStore,
    proposal_id: i64,
    logo_url: Option<&str>,
) -> Result<Publication, Error> {
    let t0 = Instant::now();

    let snapshot = snapshot::load(store, proposal_id).await?;
    let metrics = finance::compute(&snapshot);
    let t_fetch = t0.elapsed();

    let logo = match logo_url {
        Some(url) => fetch_logo(url).await,
        None => None,
    };
    let t_logo = t0.elapsed();

    let document = pdf::render(&snapshot, &metrics);
    let bytes = pdf::encode(&document, logo.as_ref()).map_err(|e| Error::Encoding {
        id: proposal_id,
        reason: e.to_string(),
    })?;
    let t_render = t0.elapsed();

    let publication = storage::publish(store, blobs, proposal_id, &bytes).await?;
    let t_total = t0.elapsed();

    log::info!(
        "Proposal {}: fetch={:.1}ms, logo={:.1}ms, render={:.1}ms, publish={:.1}ms, total={:.1}ms ({} pages, {} bytes)",
        proposal_id,
        t_fetch.as_secs_f64() * 1000.0,
        (t_logo - t_fetch).as_secs_f64() * 1000.0,
        (t_render - t_logo).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        document.page_count(),
        bytes.len(),
    );

    Ok(publication)
}

/// Fetch the customer logo over HTTP. Any failure (network, status, format)
/// logs and yields None.
async fn fetch_logo(url: &str) -> Option<Logo> {
    let response = match reqwest::get(url).await {
        Ok(r) => r,
        Err(e) => {
            log::warn!("logo fetch from {url} failed: {e}");
            return None;
        }
    };
    if !response.status().is_success() {
        log::warn!("logo fetch from {url} returned {}", response.status());
        return None;
    }
    let bytes = match response.bytes().await {
        Ok(b) => b.to_vec(),
        Err(e) => {
            log::warn!("logo body read failed: {e}");
            return None;
        }
    };

    let format = match image::guess_format(&bytes) {
        Ok(image::ImageFormat::Png) => LogoFormat::Png,
        Ok(image::ImageFormat::Jpeg) => LogoFormat::Jpeg,
        Ok(other) => {
            log::warn!("unsupported logo format {other:?}, skipping");
            return None;
        }
        Err(e) => {
            log::warn!("logo format detection failed: {e}");
            return None;
        }
    };

    let (pixel_width, pixel_height) = match image::load_from_memory(&bytes) {
        Ok(img) => (img.width(), img.height()),
        Err(e) => {
            log::warn!("logo decode failed: {e}");
            return None;
        }
    };

    Some(Logo {
        data: bytes,
        format,
        pixel_width,
        pixel_height,
    })
}
