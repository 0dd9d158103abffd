use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::Resource;
use crate::ResourceKind;
use crate::ResourcePath;
use crate::StoreResult;

/// Hierarchical resource store the coordinator runs against.
///
/// The store owns persistence, optimistic versioning and soft delete:
/// - `delete` on a resource whose subtree holds finalizers only sets
///   `deletion_requested`, on the resource and on every finalized descendant
/// - a resource is physically removed once it is deletion-requested and neither
///   it nor any descendant holds a finalizer
///
/// Event delivery is store-defined (at-least-once, best-effort ordering per
/// resource). Handlers must tolerate duplicates.
#[cfg_attr(test, automock)]
pub trait ResourceStore: Send + Sync + 'static {
    fn get(
        &self,
        path: &ResourcePath,
    ) -> StoreResult<Resource>;

    /// Creates the resource; the store assigns key, uid and version.
    fn add(
        &self,
        resource: Resource,
    ) -> StoreResult<Resource>;

    /// Writes the resource if its version still matches the stored one.
    fn update(
        &self,
        resource: Resource,
    ) -> StoreResult<Resource>;

    fn delete(
        &self,
        path: &ResourcePath,
    ) -> StoreResult<()>;

    fn get_parent(
        &self,
        resource: &Resource,
    ) -> StoreResult<Resource>;

    /// Direct children of `parent` with the given kind.
    fn list_children(
        &self,
        parent: &ResourcePath,
        kind: ResourceKind,
    ) -> StoreResult<Vec<Resource>>;

    /// Subscribes a handler to add/update/delete events of one kind.
    fn subscribe(
        &self,
        kind: ResourceKind,
        handler: Arc<dyn ResourceEventHandler>,
    );
}

/// Typed subscriber invoked by the store's change-notification layer.
pub trait ResourceEventHandler: Send + Sync + 'static {
    fn on_add(
        &self,
        resource: &Resource,
    );

    fn on_update(
        &self,
        old: &Resource,
        new: &Resource,
    );

    fn on_delete(
        &self,
        resource: &Resource,
    );
}
