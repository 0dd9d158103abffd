//! Scenario "foo": both watchers acknowledged, then deregister one after the
//! other once the project is marked for deletion.

use tenant_coordinator::ResourceKind;
use tenant_coordinator::StatusIndicator;
use tenant_coordinator::WatcherIndicator;
use tenant_coordinator::COORDINATOR_FINALIZER;
use tenant_coordinator::DEFAULT_FOLDER;

use crate::common::TestContext;

#[tokio::test(start_paused = true)]
async fn test_foo_is_removed_after_the_last_watcher_leaves() {
    let ctx = TestContext::start(&[], &["w1", "w2"]);
    ctx.create_org("fanta").await;
    let foo = ctx.create_project("fanta", "foo").await;
    ctx.watcher_joins(&foo, "w1", WatcherIndicator::Idle).await;
    ctx.watcher_joins(&foo, "w2", WatcherIndicator::Idle).await;
    assert_eq!(ctx.status(&foo).0, StatusIndicator::Idle);

    ctx.delete(&foo).await;
    assert_eq!(
        ctx.status(&foo),
        (
            StatusIndicator::InProgress,
            "Waiting for watchers [w1, w2] to be deleted".to_string()
        )
    );
    let runtime = foo.to_runtime().unwrap();
    assert!(ctx.store_record(&runtime).is_tombstoned());

    ctx.watcher_leaves(&foo, "w1").await;
    assert_eq!(
        ctx.status(&foo),
        (
            StatusIndicator::InProgress,
            "Waiting for watchers [w2] to be deleted".to_string()
        )
    );
    assert!(ctx.exists(&runtime));

    ctx.watcher_leaves(&foo, "w2").await;
    assert!(!ctx.exists(&runtime));
    assert!(!ctx.exists(&foo));
    assert_eq!(ctx.coordinator.live_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_resource_is_never_removed_while_a_watcher_is_present() {
    let ctx = TestContext::start(&["w1", "w2"], &[]);
    let org = ctx.create_org("acme").await;
    ctx.watcher_joins(&org, "w1", WatcherIndicator::Idle).await;
    ctx.watcher_joins(&org, "w2", WatcherIndicator::Idle).await;
    ctx.delete(&org).await;

    ctx.watcher_leaves(&org, "w1").await;
    for _ in 0..3 {
        ctx.advance(2).await;
        let record = ctx.store_record(&org);
        assert!(record.has_finalizer(COORDINATOR_FINALIZER));
        assert!(ctx.exists(&org.to_runtime().unwrap()));
    }
}

#[tokio::test(start_paused = true)]
async fn test_unacknowledged_but_present_watcher_blocks_deletion() {
    let ctx = TestContext::start(&["w1"], &[]);
    let org = ctx.create_org("acme").await;
    ctx.watcher_joins(&org, "w1", WatcherIndicator::InProgress).await;

    ctx.delete(&org).await;

    assert_eq!(
        ctx.status(&org).1,
        "Waiting for watchers [w1] to be deleted"
    );
    ctx.watcher_leaves(&org, "w1").await;
    assert!(!ctx.exists(&org));
}

#[tokio::test(start_paused = true)]
async fn test_org_without_watchers_is_removed_with_its_structure() {
    let ctx = TestContext::start(&[], &[]);
    let org = ctx.create_org("acme").await;
    let folder = org.child(ResourceKind::Folder, DEFAULT_FOLDER);
    assert!(ctx.exists(&folder));

    ctx.delete(&org).await;

    assert!(!ctx.exists(&org));
    assert!(!ctx.exists(&folder));
    assert!(!ctx.exists(&org.to_runtime().unwrap()));
}

#[tokio::test(start_paused = true)]
async fn test_watchers_that_left_before_deletion_do_not_block_it() {
    let ctx = TestContext::start(&["w1"], &[]);
    let org = ctx.create_org("acme").await;
    ctx.watcher_joins(&org, "w1", WatcherIndicator::Idle).await;
    ctx.watcher_leaves(&org, "w1").await;
    assert_eq!(ctx.status(&org).0, StatusIndicator::Idle);

    ctx.delete(&org).await;

    assert!(!ctx.exists(&org));
}
