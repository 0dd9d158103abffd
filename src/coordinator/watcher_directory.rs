use std::collections::BTreeSet;

use crate::ResourcePath;
use crate::ResourceStore;
use crate::StoreResult;
use crate::TenantKind;

/// Names of the globally registered watchers that must acknowledge every
/// lifecycle event of `kind`.
pub fn expected_watchers(
    store: &dyn ResourceStore,
    kind: TenantKind,
) -> StoreResult<BTreeSet<String>> {
    let entries = store.list_children(&ResourcePath::root(), kind.directory_kind())?;
    Ok(entries.into_iter().map(|r| r.name().to_string()).collect())
}
