mod common;

use common::{FakeBlobs, FakeStore};
use proposal_pdf::{ErrorKind, storage};

#[tokio::test]
async fn generate_uploads_and_links_artifact() {
    let store = FakeStore::with(common::record(
        77,
        vec![common::screen(1, "São Paulo", "SP", 1000.0)],
    ));
    let blobs = FakeBlobs::new();

    let publication = proposal_pdf::generate(&store, &blobs, 77, None)
        .await
        .unwrap();

    assert_eq!(publication.path, "pdf/proposal_77.pdf");
    assert!(publication.signed_url.is_some());
    assert!(publication.expires_at.is_some());

    let uploads = blobs.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "pdf/proposal_77.pdf");
    assert!(uploads[0].1 > 0);

    let linked = store.linked.lock().unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].0, 77);
    assert_eq!(linked[0].1, "pdf/proposal_77.pdf");
    assert!(linked[0].2.is_some());
}

#[tokio::test]
async fn regeneration_overwrites_the_same_path() {
    let store = FakeStore::with(common::record(
        5,
        vec![common::screen(1, "São Paulo", "SP", 500.0)],
    ));
    let blobs = FakeBlobs::new();

    let first = proposal_pdf::generate(&store, &blobs, 5, None).await.unwrap();
    let second = proposal_pdf::generate(&store, &blobs, 5, None).await.unwrap();

    assert_eq!(first.path, second.path);
    let uploads = blobs.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].0, uploads[1].0);
}

#[tokio::test]
async fn missing_proposal_is_not_found() {
    let store = FakeStore::empty();
    let blobs = FakeBlobs::new();

    let err = proposal_pdf::generate(&store, &blobs, 404, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.proposal_id(), 404);
    assert_eq!(err.kind().as_str(), "not_found");
    // Nothing was produced or linked.
    assert!(blobs.uploads.lock().unwrap().is_empty());
    assert!(store.linked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_bucket_is_created_once_and_upload_retried() {
    let store = FakeStore::with(common::record(
        9,
        vec![common::screen(1, "São Paulo", "SP", 100.0)],
    ));
    let blobs = FakeBlobs::without_bucket();

    let publication = proposal_pdf::generate(&store, &blobs, 9, None)
        .await
        .unwrap();

    assert_eq!(*blobs.bucket_creates.lock().unwrap(), 1);
    assert_eq!(blobs.uploads.lock().unwrap().len(), 1);
    assert_eq!(publication.path, "pdf/proposal_9.pdf");
}

#[tokio::test]
async fn failed_bucket_create_surfaces_storage_error() {
    let store = FakeStore::with(common::record(
        10,
        vec![common::screen(1, "São Paulo", "SP", 100.0)],
    ));
    let mut blobs = FakeBlobs::without_bucket();
    blobs.fail_bucket_create = true;

    let err = proposal_pdf::generate(&store, &blobs, 10, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(store.linked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn write_back_failure_is_publish_error_and_names_the_path() {
    let mut store = FakeStore::with(common::record(
        11,
        vec![common::screen(1, "São Paulo", "SP", 100.0)],
    ));
    store.fail_link = true;
    let blobs = FakeBlobs::new();

    let err = proposal_pdf::generate(&store, &blobs, 11, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Publish);
    assert!(err.to_string().contains("pdf/proposal_11.pdf"));
    // The blob exists even though the record was never linked.
    assert_eq!(blobs.uploads.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn signing_failure_degrades_to_path_only_link() {
    let store = FakeStore::with(common::record(
        12,
        vec![common::screen(1, "São Paulo", "SP", 100.0)],
    ));
    let mut blobs = FakeBlobs::new();
    blobs.fail_sign = true;

    let publication = proposal_pdf::generate(&store, &blobs, 12, None)
        .await
        .unwrap();

    assert!(publication.signed_url.is_none());
    assert!(publication.expires_at.is_none());
    let linked = store.linked.lock().unwrap();
    assert_eq!(linked[0].1, "pdf/proposal_12.pdf");
    assert!(linked[0].2.is_none());
}

#[test]
fn artifact_path_is_deterministic() {
    assert_eq!(storage::artifact_path(123), "pdf/proposal_123.pdf");
    assert_eq!(storage::artifact_path(123), storage::artifact_path(123));
}
