//! Deleting an org whose projects are still watched: every project drains on
//! its own before the org and its runtime tree go away.

use tenant_coordinator::StatusIndicator;
use tenant_coordinator::WatcherIndicator;
use tenant_coordinator::COORDINATOR_FINALIZER;

use crate::common::record_path;
use crate::common::TestContext;
use crate::common::DEADLINE_IN_SECS;

#[tokio::test(start_paused = true)]
async fn test_org_deletion_drains_watched_project_first() {
    let ctx = TestContext::start(&[], &["w1"]);
    let org = ctx.create_org("fanta").await;
    let foo = ctx.create_project("fanta", "foo").await;
    ctx.watcher_joins(&foo, "w1", WatcherIndicator::Idle).await;
    assert_eq!(ctx.status(&foo).0, StatusIndicator::Idle);

    ctx.delete(&org).await;
    ctx.advance(1).await;

    assert_eq!(
        ctx.status(&org),
        (
            StatusIndicator::InProgress,
            "Waiting for projects [foo] to be deleted".to_string()
        )
    );
    assert_eq!(
        ctx.status(&foo),
        (
            StatusIndicator::InProgress,
            "Waiting for watchers [w1] to be deleted".to_string()
        )
    );
    let project = ctx.store_record(&foo);
    assert!(project.meta.deletion_requested);
    assert!(project.has_finalizer(COORDINATOR_FINALIZER));
    assert!(ctx.store_record(&foo.to_runtime().unwrap()).is_tombstoned());
    assert!(ctx.exists(&record_path(&foo, "w1")));

    ctx.watcher_leaves(&foo, "w1").await;

    assert!(!ctx.exists(&foo));
    assert!(!ctx.exists(&foo.to_runtime().unwrap()));
    assert!(!ctx.exists(&org));
    assert!(!ctx.exists(&org.to_runtime().unwrap()));
}

#[tokio::test(start_paused = true)]
async fn test_org_waits_while_project_drain_times_out() {
    let ctx = TestContext::start(&[], &["w1"]);
    let org = ctx.create_org("fanta").await;
    let foo = ctx.create_project("fanta", "foo").await;
    ctx.watcher_joins(&foo, "w1", WatcherIndicator::Idle).await;

    ctx.delete(&org).await;
    ctx.advance(DEADLINE_IN_SECS + 1).await;

    assert_eq!(ctx.status(&foo).0, StatusIndicator::Error);
    assert_eq!(ctx.status(&org).0, StatusIndicator::InProgress);
    assert!(ctx.exists(&record_path(&foo, "w1")));
    assert!(ctx.exists(&org.to_runtime().unwrap()));

    ctx.watcher_leaves(&foo, "w1").await;
    assert!(!ctx.exists(&org));
}
