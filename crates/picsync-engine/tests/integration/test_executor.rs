//! Executor behavior exercised directly over a queue, without the
//! coordinator in between.

use std::path::PathBuf;
use std::sync::Arc;

use picsync_core::domain::{AlbumId, SyncTask, TaskError};
use picsync_engine::{LocalStoreAdapter, Progress, TaskExecutor, TaskQueue};

use crate::common::{title, FakeAlbumService};

fn executor_over(
    service: Arc<FakeAlbumService>,
) -> (Arc<TaskQueue>, Arc<TaskExecutor>) {
    let queue = Arc::new(TaskQueue::new());
    let executor = Arc::new(TaskExecutor::new(
        service,
        Arc::new(LocalStoreAdapter::new()),
        queue.clone(),
    ));
    (queue, executor)
}

#[tokio::test]
async fn test_create_album_publishes_its_id_to_dependent_uploads() {
    let service = Arc::new(FakeAlbumService::default());
    let (queue, executor) = executor_over(service.clone());

    queue
        .enqueue_all(vec![
            SyncTask::create_album(title("Trip"), PathBuf::from("/pics/Trip/a.jpg")),
            SyncTask::upload(title("Trip"), PathBuf::from("/pics/Trip/b.jpg"), None),
        ])
        .await;

    let report = executor.run().await;

    assert!(report.is_clean(), "failures: {:?}", report.failures);
    assert_eq!(report.succeeded, 2);

    // The second task observed the id allocated by the first.
    let album_id = service.remote_albums()[0].id.to_string();
    let attachments = service.attachments();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].0, album_id);
}

#[tokio::test]
async fn test_upload_without_album_id_fails_validation_not_transfer() {
    let service = Arc::new(FakeAlbumService::default());
    let (queue, executor) = executor_over(service.clone());

    // No CreateAlbum precedes this, so the id never arrives.
    queue
        .enqueue_all(vec![SyncTask::upload(
            title("Trip"),
            PathBuf::from("/pics/Trip/b.jpg"),
            None,
        )])
        .await;

    let report = executor.run().await;

    assert_eq!(report.total, 1);
    assert_eq!(report.succeeded, 0);
    assert!(matches!(report.failures[0].error, TaskError::Validation(_)));
    assert!(service.uploaded_files().is_empty(), "the transfer never started");
}

#[tokio::test]
async fn test_progress_updates_after_each_task() {
    let service = Arc::new(FakeAlbumService::default());
    service.seed_album("9", "Trip", &[]);
    let (queue, executor) = executor_over(service.clone());

    let album_id = AlbumId::new("9").unwrap();
    queue
        .enqueue_all(vec![
            SyncTask::upload(title("Trip"), PathBuf::from("/p/x.jpg"), Some(album_id.clone())),
            SyncTask::upload(title("Trip"), PathBuf::from("/p/y.jpg"), Some(album_id.clone())),
            SyncTask::upload(title("Trip"), PathBuf::from("/p/z.jpg"), Some(album_id)),
        ])
        .await;

    let progress = executor.progress();
    let mut started = service.gate_upload("y");

    let runner = {
        let executor = executor.clone();
        tokio::spawn(async move { executor.run().await })
    };

    // y has started, so x has settled and its progress update is out.
    started.recv().await.unwrap();
    assert_eq!(*progress.borrow(), Progress { done: 1, total: 3 });

    executor.cancel().await;
    let report = runner.await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.cancelled(), 1);
    assert_eq!(*progress.borrow(), Progress { done: 1, total: 3 });
}

#[tokio::test]
async fn test_cancel_empties_registry_and_pending_queue() {
    let service = Arc::new(FakeAlbumService::default());
    service.seed_album("9", "Trip", &[]);
    let (queue, executor) = executor_over(service.clone());

    let album_id = AlbumId::new("9").unwrap();
    queue
        .enqueue_all(vec![
            SyncTask::upload(title("Trip"), PathBuf::from("/p/a.jpg"), Some(album_id.clone())),
            SyncTask::upload(title("Trip"), PathBuf::from("/p/b.jpg"), Some(album_id.clone())),
            SyncTask::upload(title("Trip"), PathBuf::from("/p/c.jpg"), Some(album_id)),
        ])
        .await;

    let mut started = service.gate_upload("b");
    let runner = {
        let executor = executor.clone();
        tokio::spawn(async move { executor.run().await })
    };
    started.recv().await.unwrap();

    executor.cancel().await;
    let report = runner.await.unwrap();

    assert_eq!(executor.in_flight_handles(), 0);
    // Only the completed task survives the cancel.
    assert_eq!(queue.counts().await, (1, 1));
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.cancelled(), 1);

    // Cancelling again finds nothing to do.
    executor.cancel().await;
    assert_eq!(executor.in_flight_handles(), 0);
}

#[tokio::test]
async fn test_empty_queue_yields_a_clean_zero_report() {
    let service = Arc::new(FakeAlbumService::default());
    let (_queue, executor) = executor_over(service);

    let report = executor.run().await;

    assert_eq!(report.total, 0);
    assert_eq!(report.succeeded, 0);
    assert!(report.is_clean());
}
