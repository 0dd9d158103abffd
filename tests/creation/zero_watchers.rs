//! With no registered watchers a creation completes without any
//! acknowledgment record ever being observed.

use tenant_coordinator::StatusIndicator;

use crate::common::TestContext;

#[tokio::test(start_paused = true)]
async fn test_acme_completes_immediately() {
    let ctx = TestContext::start(&[], &[]);

    let acme = ctx.create_org("acme").await;

    assert_eq!(
        ctx.status(&acme),
        (StatusIndicator::Idle, "Org acme CREATE is complete".to_string())
    );
    assert!(!ctx.coordinator.has_timer(&acme));
    assert_eq!(ctx.coordinator.live_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_project_under_fresh_org_completes_immediately() {
    let ctx = TestContext::start(&[], &[]);
    ctx.create_org("acme").await;

    let foo = ctx.create_project("acme", "foo").await;

    assert_eq!(
        ctx.status(&foo),
        (StatusIndicator::Idle, "Project foo CREATE is complete".to_string())
    );
    assert!(ctx.exists(&foo.to_runtime().unwrap()));
}
