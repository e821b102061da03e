//! Full reconcile / select / run cycles through the coordinator.

use picsync_core::domain::{DomainError, TaskError};
use picsync_engine::Phase;

use crate::common::{setup, title, write_local_album};

#[tokio::test]
async fn test_reconcile_covers_all_album_shapes() {
    let (root, service, coordinator) = setup();
    write_local_album(root.path(), "Both", &["sunset.jpg", "beach.png", "notes.txt"]).await;
    write_local_album(root.path(), "LocalOnly", &["a.jpg", "b.gif"]).await;
    service.seed_album("1", "Both", &[("p1", "sunset"), ("p2", "mountain")]);
    service.seed_album("2", "RemoteOnly", &[("p3", "x"), ("p4", "y"), ("p5", "z")]);

    let report = coordinator.reconcile().await.unwrap();

    assert!(report.errors.is_empty());
    assert_eq!(report.summaries.len(), 3);

    // Remote albums first, in service order, then local-only directories.
    let both = &report.summaries[0];
    assert_eq!(both.title.as_str(), "Both");
    assert_eq!(both.upload_count, 1, "beach is local-only");
    assert_eq!(both.download_count, 1, "mountain is remote-only");

    let remote_only = &report.summaries[1];
    assert_eq!(remote_only.title.as_str(), "RemoteOnly");
    assert_eq!(remote_only.upload_count, 0);
    assert_eq!(remote_only.download_count, 3);

    let local_only = &report.summaries[2];
    assert_eq!(local_only.title.as_str(), "LocalOnly");
    assert_eq!(local_only.upload_count, 2);
    assert_eq!(local_only.download_count, 0);

    assert_eq!(coordinator.current_phase(), Phase::AwaitingSelection);
    assert_eq!(coordinator.summaries().await, report.summaries);
}

#[tokio::test]
async fn test_reconcile_twice_is_idempotent() {
    let (root, service, coordinator) = setup();
    write_local_album(root.path(), "Trip", &["a.jpg", "b.jpg"]).await;
    service.seed_album("1", "Trip", &[("p1", "a")]);

    let first = coordinator.reconcile().await.unwrap();
    let second = coordinator.reconcile().await.unwrap();

    assert_eq!(first.summaries, second.summaries);
}

#[tokio::test]
async fn test_reconcile_isolates_per_album_failures() {
    let (root, service, coordinator) = setup();
    write_local_album(root.path(), "Good", &["a.jpg"]).await;
    write_local_album(root.path(), "Bad", &["b.jpg"]).await;
    service.seed_album("1", "Good", &[("p1", "a")]);
    service.seed_album("2", "Bad", &[("p2", "b")]);
    service.fail_photo_listing_for("2");

    let report = coordinator.reconcile().await.unwrap();

    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.summaries[0].title.as_str(), "Good");
    assert!(report.summaries[0].in_sync());
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("Bad"), "error names the album: {}", report.errors[0]);
}

#[tokio::test]
async fn test_upload_cycle_creates_album_and_propagates_its_id() {
    let (root, service, coordinator) = setup();
    write_local_album(root.path(), "Trip", &["a.jpg", "b.jpg"]).await;

    coordinator.reconcile().await.unwrap();
    let enqueued = coordinator.select(&[title("Trip")]).await.unwrap();
    assert_eq!(enqueued, 2, "one creation plus one upload");

    let report = coordinator.run().await.unwrap();

    assert!(report.is_clean(), "failures: {:?}", report.failures);
    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 2);

    assert_eq!(service.created_albums(), vec!["Trip".to_string()]);
    // a.jpg seeded the album; only b.jpg went through a plain upload.
    let uploaded = service.uploaded_files();
    assert_eq!(uploaded.len(), 1);
    assert!(uploaded[0].ends_with("b.jpg"));

    // The upload was attached to the album allocated by the creation.
    let album_id = service.remote_albums()[0].id.to_string();
    let attachments = service.attachments();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].0, album_id);

    // Post-run refresh: the album is now in sync and the pass is over.
    assert_eq!(coordinator.current_phase(), Phase::Idle);
    assert!(coordinator.planned_tasks().await.is_empty());
    let summaries = coordinator.summaries().await;
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].in_sync());
}

#[tokio::test]
async fn test_download_cycle_writes_photo_files() {
    let (root, service, coordinator) = setup();
    service.seed_album("v1", "Vacation", &[("p1", "sunset")]);

    coordinator.reconcile().await.unwrap();
    let enqueued = coordinator.select(&[title("Vacation")]).await.unwrap();
    assert_eq!(enqueued, 1);

    let report = coordinator.run().await.unwrap();
    assert!(report.is_clean(), "failures: {:?}", report.failures);

    let file = root.path().join("Vacation").join("sunset.jpg");
    let data = tokio::fs::read(&file).await.unwrap();
    assert_eq!(data, b"content-of-p1");

    let summaries = coordinator.summaries().await;
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].in_sync());
}

#[tokio::test]
async fn test_one_failed_transfer_does_not_stop_the_batch() {
    let (root, service, coordinator) = setup();
    write_local_album(root.path(), "Trip", &["bad.jpg", "good.jpg"]).await;
    service.seed_album("9", "Trip", &[]);
    service.fail_uploads_of("bad");

    coordinator.reconcile().await.unwrap();
    coordinator.select(&[title("Trip")]).await.unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed(), 1);
    assert!(!report.was_cancelled());

    let failure = &report.failures[0];
    assert!(matches!(failure.error, TaskError::Transfer(_)));
    assert!(failure.description.contains("bad.jpg"));

    // good.jpg was uploaded and attached despite the earlier failure.
    let uploaded = service.uploaded_files();
    assert_eq!(uploaded.len(), 1);
    assert!(uploaded[0].ends_with("good.jpg"));
    assert_eq!(service.attachments().len(), 1);
}

#[tokio::test]
async fn test_select_rejects_titles_not_in_the_last_pass() {
    let (_root, _service, coordinator) = setup();
    coordinator.reconcile().await.unwrap();

    let err = coordinator.select(&[title("Ghost")]).await.unwrap_err();
    let domain = err.downcast_ref::<DomainError>().unwrap();
    assert_eq!(domain, &DomainError::UnknownAlbum("Ghost".to_string()));

    assert!(coordinator.planned_tasks().await.is_empty());
}

#[tokio::test]
async fn test_select_and_run_require_their_phase() {
    let (_root, _service, coordinator) = setup();
    assert_eq!(coordinator.current_phase(), Phase::Idle);

    let err = coordinator.select(&[title("Trip")]).await.unwrap_err();
    assert!(err.downcast_ref::<DomainError>().is_some());

    let err = coordinator.run().await.unwrap_err();
    assert!(err.downcast_ref::<DomainError>().is_some());

    assert_eq!(coordinator.current_phase(), Phase::Idle);
}

#[tokio::test]
async fn test_deselect_removes_only_that_albums_pending_tasks() {
    let (root, service, coordinator) = setup();
    write_local_album(root.path(), "Drop", &["a.jpg", "b.jpg"]).await;
    write_local_album(root.path(), "Keep", &["c.jpg"]).await;

    coordinator.reconcile().await.unwrap();
    coordinator.select(&[title("Drop"), title("Keep")]).await.unwrap();
    assert_eq!(coordinator.planned_tasks().await.len(), 3);

    let removed = coordinator.deselect(&title("Drop")).await;
    assert_eq!(removed, 2);

    let remaining = coordinator.planned_tasks().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].album_title().as_str(), "Keep");

    let report = coordinator.run().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(service.created_albums(), vec!["Keep".to_string()]);
}

#[tokio::test]
async fn test_album_without_qualifying_files_is_never_created() {
    let (root, service, coordinator) = setup();
    write_local_album(root.path(), "Empty", &["notes.txt"]).await;

    let report = coordinator.reconcile().await.unwrap();
    assert_eq!(report.summaries.len(), 1);
    assert!(report.summaries[0].in_sync(), "nothing qualifies for upload");

    let enqueued = coordinator.select(&[title("Empty")]).await.unwrap();
    assert_eq!(enqueued, 0);

    let run = coordinator.run().await.unwrap();
    assert_eq!(run.total, 0);
    assert!(service.created_albums().is_empty());
}

#[tokio::test]
async fn test_selecting_a_remote_only_album_creates_its_directory() {
    let (root, service, coordinator) = setup();
    service.seed_album("v1", "Fresh", &[("p1", "pic")]);

    coordinator.reconcile().await.unwrap();
    coordinator.select(&[title("Fresh")]).await.unwrap();

    assert!(root.path().join("Fresh").is_dir());
}
