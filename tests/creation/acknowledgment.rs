//! Scenario "fanta": w1 joins already idle, w2 joins in progress and turns
//! idle two seconds later, well before the 8s deadline.

use tenant_coordinator::StatusIndicator;
use tenant_coordinator::WatcherIndicator;

use crate::common::TestContext;

#[tokio::test(start_paused = true)]
async fn test_fanta_reaches_idle_once_every_watcher_acknowledges() {
    let ctx = TestContext::start(&["w1", "w2"], &[]);
    let fanta = ctx.create_org("fanta").await;
    assert_eq!(
        ctx.status(&fanta),
        (
            StatusIndicator::InProgress,
            "Waiting for watchers [w1, w2] to acknowledge org fanta".to_string()
        )
    );

    ctx.watcher_joins(&fanta, "w1", WatcherIndicator::Idle).await;
    ctx.watcher_joins(&fanta, "w2", WatcherIndicator::InProgress).await;
    assert_eq!(
        ctx.status(&fanta),
        (
            StatusIndicator::InProgress,
            "Waiting for watchers [w2] to acknowledge org fanta".to_string()
        )
    );

    ctx.advance(2).await;
    ctx.watcher_reports(&fanta, "w2", WatcherIndicator::Idle).await;

    assert_eq!(
        ctx.status(&fanta),
        (StatusIndicator::Idle, "Org fanta CREATE is complete".to_string())
    );
    assert!(!ctx.coordinator.has_timer(&fanta));

    // Nothing left to fire at the deadline
    ctx.advance(10).await;
    assert_eq!(ctx.status(&fanta).0, StatusIndicator::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_idle_requires_every_expected_watcher() {
    let ctx = TestContext::start(&["w1", "w2", "w3"], &[]);
    let org = ctx.create_org("fanta").await;

    ctx.watcher_joins(&org, "w1", WatcherIndicator::Idle).await;
    ctx.watcher_joins(&org, "w2", WatcherIndicator::Idle).await;
    ctx.watcher_joins(&org, "w3", WatcherIndicator::Error).await;

    assert_eq!(ctx.status(&org).0, StatusIndicator::InProgress);

    ctx.watcher_reports(&org, "w3", WatcherIndicator::Idle).await;
    assert_eq!(ctx.status(&org).0, StatusIndicator::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_project_acknowledgment_is_independent_of_org_watchers() {
    let ctx = TestContext::start(&["o1"], &["p1"]);
    let org = ctx.create_org("fanta").await;
    ctx.watcher_joins(&org, "o1", WatcherIndicator::Idle).await;

    let foo = ctx.create_project("fanta", "foo").await;
    assert_eq!(ctx.status(&foo).0, StatusIndicator::InProgress);

    ctx.watcher_joins(&foo, "p1", WatcherIndicator::Idle).await;
    assert_eq!(
        ctx.status(&foo),
        (StatusIndicator::Idle, "Project foo CREATE is complete".to_string())
    );
}
