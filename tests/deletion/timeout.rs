//! Scenario "bar": one watcher never deregisters, so the deletion times out
//! and the project is kept for an operator.

use tenant_coordinator::StatusIndicator;
use tenant_coordinator::WatcherIndicator;
use tenant_coordinator::COORDINATOR_FINALIZER;

use crate::common::TestContext;
use crate::common::DEADLINE_IN_SECS;

#[tokio::test(start_paused = true)]
async fn test_bar_deletion_times_out_and_keeps_the_project() {
    let ctx = TestContext::start(&[], &["w1"]);
    ctx.create_org("fanta").await;
    let bar = ctx.create_project("fanta", "bar").await;
    ctx.watcher_joins(&bar, "w1", WatcherIndicator::Idle).await;

    ctx.delete(&bar).await;
    ctx.advance(DEADLINE_IN_SECS + 1).await;

    assert_eq!(
        ctx.status(&bar),
        (
            StatusIndicator::Error,
            "Timeout, cannot be deleted as active watchers [w1] have acknowledged this project"
                .to_string()
        )
    );
    let record = ctx.store_record(&bar);
    assert!(record.meta.deletion_requested);
    assert!(record.has_finalizer(COORDINATOR_FINALIZER));
    assert!(ctx.exists(&bar.to_runtime().unwrap()));
    assert!(!ctx.coordinator.has_timer(&bar));
}

#[tokio::test(start_paused = true)]
async fn test_straggler_leaving_after_timeout_finishes_deletion() {
    let ctx = TestContext::start(&[], &["w1"]);
    ctx.create_org("fanta").await;
    let bar = ctx.create_project("fanta", "bar").await;
    ctx.watcher_joins(&bar, "w1", WatcherIndicator::Idle).await;
    ctx.delete(&bar).await;
    ctx.advance(DEADLINE_IN_SECS + 1).await;

    ctx.watcher_leaves(&bar, "w1").await;

    assert!(!ctx.exists(&bar));
    assert!(!ctx.exists(&bar.to_runtime().unwrap()));
}

#[tokio::test(start_paused = true)]
async fn test_partial_drain_after_timeout_stays_in_error() {
    let ctx = TestContext::start(&[], &["w1", "w2"]);
    ctx.create_org("fanta").await;
    let bar = ctx.create_project("fanta", "bar").await;
    ctx.watcher_joins(&bar, "w1", WatcherIndicator::Idle).await;
    ctx.watcher_joins(&bar, "w2", WatcherIndicator::Idle).await;
    ctx.delete(&bar).await;
    ctx.advance(DEADLINE_IN_SECS + 1).await;

    ctx.watcher_leaves(&bar, "w1").await;

    let expected = (
        StatusIndicator::Error,
        "Timeout, cannot be deleted as active watchers [w2] have acknowledged this project".to_string(),
    );
    assert_eq!(ctx.status(&bar), expected);
    assert!(!ctx.coordinator.has_timer(&bar));

    ctx.advance(1000).await;
    assert_eq!(ctx.status(&bar), expected);
    assert!(ctx.store_record(&bar).has_finalizer(COORDINATOR_FINALIZER));

    ctx.watcher_leaves(&bar, "w2").await;
    assert!(!ctx.exists(&bar));
}
