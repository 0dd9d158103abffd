//! Status message catalogue. These strings are user-visible on the resource
//! status and are matched by operators and tests.

use std::collections::BTreeSet;

use crate::TenantKind;

/// Renders a name set as `[a, b]`.
pub fn watcher_list(watchers: &BTreeSet<String>) -> String {
    let names: Vec<&str> = watchers.iter().map(String::as_str).collect();
    format!("[{}]", names.join(", "))
}

pub fn create_initiated(
    kind: TenantKind,
    name: &str,
) -> String {
    format!("{} {name} CREATE initiated", kind.label())
}

pub fn create_complete(
    kind: TenantKind,
    name: &str,
) -> String {
    format!("{} {name} CREATE is complete", kind.label())
}

pub fn waiting_for_ack(
    kind: TenantKind,
    name: &str,
    pending: &BTreeSet<String>,
) -> String {
    format!(
        "Waiting for watchers {} to acknowledge {} {name}",
        watcher_list(pending),
        kind.noun()
    )
}

pub fn ack_timeout(
    kind: TenantKind,
    name: &str,
    pending: &BTreeSet<String>,
) -> String {
    format!(
        "Timeout, watchers {} have not acknowledged {} {name}",
        watcher_list(pending),
        kind.noun()
    )
}

pub fn waiting_for_drain(present: &BTreeSet<String>) -> String {
    format!("Waiting for watchers {} to be deleted", watcher_list(present))
}

pub fn drain_timeout(
    kind: TenantKind,
    present: &BTreeSet<String>,
) -> String {
    format!(
        "Timeout, cannot be deleted as active watchers {} have acknowledged this {}",
        watcher_list(present),
        kind.noun()
    )
}

pub fn waiting_for_projects(projects: &BTreeSet<String>) -> String {
    format!("Waiting for projects {} to be deleted", watcher_list(projects))
}

pub fn structural_failure(
    kind: TenantKind,
    name: &str,
    what: &str,
    error: &dyn std::fmt::Display,
) -> String {
    format!("Failed to create {what} for {} {name}: {error}", kind.noun())
}

pub fn directory_failure(
    kind: TenantKind,
    error: &dyn std::fmt::Display,
) -> String {
    format!("Failed to read {} watchers: {error}", kind.noun())
}

pub fn check_failure(
    kind: TenantKind,
    name: &str,
    error: &dyn std::fmt::Display,
) -> String {
    format!("Failed to check watchers of {} {name}: {error}", kind.noun())
}
