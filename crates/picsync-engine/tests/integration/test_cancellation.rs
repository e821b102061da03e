//! Cancellation and stop behavior, mid-batch and at rest.

use picsync_core::domain::TaskError;
use picsync_engine::Phase;

use crate::common::{setup, title, write_local_album};

#[tokio::test]
async fn test_stop_interrupts_the_batch_and_reconciles() {
    let (root, service, coordinator) = setup();
    write_local_album(root.path(), "Trip", &["a.jpg", "b.jpg", "c.jpg"]).await;

    coordinator.reconcile().await.unwrap();
    coordinator.select(&[title("Trip")]).await.unwrap();

    // Park the second task (the upload of b) once it starts.
    let mut started = service.gate_upload("b");

    let runner = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.run().await })
    };
    started.recv().await.unwrap();

    let stop_report = coordinator.stop().await.unwrap();
    let run_report = runner.await.unwrap().unwrap();

    // The creation finished, the parked upload was cancelled, and the
    // third task was never dequeued.
    assert_eq!(run_report.total, 3);
    assert_eq!(run_report.succeeded, 1);
    assert_eq!(run_report.cancelled(), 1);
    assert_eq!(run_report.failed(), 0);
    assert!(run_report.was_cancelled());

    let failure = &run_report.failures[0];
    assert_eq!(failure.error, TaskError::Cancelled);
    assert!(failure.description.contains("b.jpg"));

    assert_eq!(service.created_albums(), vec!["Trip".to_string()]);
    assert!(service.uploaded_files().is_empty(), "b was parked, c never ran");

    // The pass is fully torn down and the fresh pass shows what is left.
    assert_eq!(coordinator.current_phase(), Phase::Idle);
    assert!(coordinator.planned_tasks().await.is_empty());
    assert_eq!(stop_report.summaries.len(), 1);
    assert_eq!(stop_report.summaries[0].upload_count, 2, "b and c still pending");
}

#[tokio::test]
async fn test_cancel_at_rest_does_not_poison_the_next_run() {
    let (root, service, coordinator) = setup();
    write_local_album(root.path(), "Trip", &["a.jpg"]).await;

    // Nothing is running; this must be a no-op.
    coordinator.cancel().await;
    assert_eq!(coordinator.current_phase(), Phase::Idle);

    coordinator.reconcile().await.unwrap();
    coordinator.select(&[title("Trip")]).await.unwrap();
    let report = coordinator.run().await.unwrap();

    assert!(report.is_clean(), "failures: {:?}", report.failures);
    assert_eq!(service.created_albums(), vec!["Trip".to_string()]);
}

#[tokio::test]
async fn test_stop_before_running_discards_the_selection() {
    let (root, service, coordinator) = setup();
    write_local_album(root.path(), "Trip", &["a.jpg", "b.jpg"]).await;

    coordinator.reconcile().await.unwrap();
    coordinator.select(&[title("Trip")]).await.unwrap();
    assert_eq!(coordinator.planned_tasks().await.len(), 2);

    let report = coordinator.stop().await.unwrap();

    assert_eq!(coordinator.current_phase(), Phase::Idle);
    assert!(coordinator.planned_tasks().await.is_empty());
    assert!(service.created_albums().is_empty(), "nothing ever ran");
    assert_eq!(report.summaries[0].upload_count, 2);
}
