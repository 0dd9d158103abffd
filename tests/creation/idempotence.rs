//! Replaying an add event for a created resource has no side effects.

use tenant_coordinator::StatusIndicator;
use tenant_coordinator::WatcherIndicator;

use crate::common::TestContext;

#[tokio::test(start_paused = true)]
async fn test_replayed_add_is_a_noop_once_idle() {
    let ctx = TestContext::start(&["w1"], &[]);
    let org = ctx.create_org("acme").await;
    ctx.watcher_joins(&org, "w1", WatcherIndicator::Idle).await;
    let before = ctx.store_record(&org);
    let nodes = ctx.store.len();

    for _ in 0..3 {
        ctx.coordinator.handle_tenant_add(&before);
    }
    ctx.settle().await;

    assert_eq!(ctx.store_record(&org), before);
    assert_eq!(ctx.store.len(), nodes);
    assert_eq!(ctx.coordinator.live_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_replayed_add_while_waiting_keeps_a_single_timer() {
    let ctx = TestContext::start(&["w1"], &[]);
    let org = ctx.create_org("acme").await;

    ctx.coordinator.handle_tenant_add(&ctx.store_record(&org));
    ctx.coordinator.handle_tenant_add(&ctx.store_record(&org));
    ctx.settle().await;

    assert_eq!(ctx.coordinator.live_timers(), 1);
    assert_eq!(ctx.status(&org).0, StatusIndicator::InProgress);
}
