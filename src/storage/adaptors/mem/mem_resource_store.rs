use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use nanoid::nanoid;
use parking_lot::Mutex;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;

use crate::Resource;
use crate::ResourceEventHandler;
use crate::ResourceKind;
use crate::ResourcePath;
use crate::ResourceStore;
use crate::StoreError;
use crate::StoreResult;

/// Store operation targeted by an injected fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Add,
    Update,
    Delete,
    ListChildren,
}

#[derive(Debug)]
struct Fault {
    op: StoreOp,
    /// `None` matches every path
    path: Option<ResourcePath>,
    error: StoreError,
    /// `None` keeps failing until cleared
    remaining: Option<usize>,
}

#[derive(Debug, Clone)]
enum StoreEvent {
    Add(Resource),
    Update(Resource, Resource),
    Delete(Resource),
}

impl StoreEvent {
    fn kind(&self) -> Option<ResourceKind> {
        match self {
            StoreEvent::Add(r) | StoreEvent::Update(_, r) | StoreEvent::Delete(r) => r.kind(),
        }
    }
}

struct MemoryStoreInner {
    nodes: RwLock<BTreeMap<ResourcePath, Resource>>,
    handlers: RwLock<HashMap<ResourceKind, Vec<Arc<dyn ResourceEventHandler>>>>,
    faults: Mutex<Vec<Fault>>,

    event_tx: mpsc::UnboundedSender<StoreEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<StoreEvent>>>,
    /// Events queued but not yet handed to every subscriber
    pending_events: AtomicUsize,
    shutdown: CancellationToken,
}

impl MemoryStoreInner {
    fn emit(
        &self,
        event: StoreEvent,
    ) {
        self.pending_events.fetch_add(1, Ordering::SeqCst);
        if self.event_tx.send(event).is_err() {
            self.pending_events.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn dispatch(
        &self,
        event: StoreEvent,
    ) {
        let handlers = event
            .kind()
            .and_then(|kind| self.handlers.read().get(&kind).cloned())
            .unwrap_or_default();

        trace!(?event, handlers = handlers.len(), "dispatching store event");

        for handler in handlers {
            match &event {
                StoreEvent::Add(r) => handler.on_add(r),
                StoreEvent::Update(old, new) => handler.on_update(old, new),
                StoreEvent::Delete(r) => handler.on_delete(r),
            }
        }
        self.pending_events.fetch_sub(1, Ordering::SeqCst);
    }

    fn check_fault(
        &self,
        op: StoreOp,
        path: &ResourcePath,
    ) -> StoreResult<()> {
        let mut faults = self.faults.lock();
        let Some(pos) = faults
            .iter()
            .position(|f| f.op == op && f.path.as_ref().map(|p| p == path).unwrap_or(true))
        else {
            return Ok(());
        };

        let error = faults[pos].error.clone();
        if let Some(remaining) = faults[pos].remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                faults.remove(pos);
            }
        }
        Err(error)
    }

    /// Removes `path` and everything below it, emitting deletes leaf-first.
    fn remove_subtree(
        &self,
        nodes: &mut BTreeMap<ResourcePath, Resource>,
        path: &ResourcePath,
    ) {
        let mut doomed: Vec<ResourcePath> = nodes
            .keys()
            .filter(|p| p.is_descendant_of(path))
            .cloned()
            .collect();
        doomed.sort_by_key(|p| std::cmp::Reverse(p.segments().len()));
        doomed.push(path.clone());

        for p in doomed {
            if let Some(removed) = nodes.remove(&p) {
                debug!(path = %p, "resource removed");
                self.emit(StoreEvent::Delete(removed));
            }
        }
    }

    /// True if any resource strictly below `path` still holds a finalizer.
    fn has_finalized_descendant(
        nodes: &BTreeMap<ResourcePath, Resource>,
        path: &ResourcePath,
    ) -> bool {
        nodes
            .iter()
            .any(|(p, r)| p.is_descendant_of(path) && !r.meta.finalizers.is_empty())
    }

    /// A resource may go once deletion was requested and neither it nor anything
    /// below it holds a finalizer.
    fn is_removable(
        nodes: &BTreeMap<ResourcePath, Resource>,
        path: &ResourcePath,
    ) -> bool {
        nodes.get(path).is_some_and(|r| {
            r.meta.deletion_requested
                && r.meta.finalizers.is_empty()
                && !Self::has_finalized_descendant(nodes, path)
        })
    }

    /// Removes `path` if it became removable, then every pending ancestor that
    /// was only held back by it.
    fn reap(
        &self,
        nodes: &mut BTreeMap<ResourcePath, Resource>,
        path: &ResourcePath,
    ) {
        let mut candidate = Some(path.clone());
        while let Some(p) = candidate {
            if !p.is_root() && Self::is_removable(nodes, &p) {
                self.remove_subtree(nodes, &p);
            }
            candidate = p.parent();
        }
    }

    /// Marks `path` and every finalized resource below it as deletion requested,
    /// emitting one update per newly marked resource.
    fn request_deletion(
        &self,
        nodes: &mut BTreeMap<ResourcePath, Resource>,
        path: &ResourcePath,
    ) {
        let marked: Vec<ResourcePath> = nodes
            .iter()
            .filter(|(p, r)| {
                !r.meta.deletion_requested
                    && (*p == path || (p.is_descendant_of(path) && !r.meta.finalizers.is_empty()))
            })
            .map(|(p, _)| p.clone())
            .collect();

        for p in marked {
            let Some(current) = nodes.get(&p).cloned() else {
                continue;
            };
            let mut next = current.clone();
            next.meta.deletion_requested = true;
            next.meta.version += 1;
            nodes.insert(p.clone(), next.clone());
            debug!(path = %p, "deletion requested, waiting for finalizers");
            self.emit(StoreEvent::Update(current, next));
        }
    }
}

/// In-memory resource store with soft delete and asynchronous event delivery.
///
/// Mutations enqueue change events on an unbounded channel; a background
/// dispatcher task (started with [`MemoryResourceStore::start`]) hands them to the
/// subscribed handlers in mutation order. Handlers may call back into the store.
#[derive(Clone)]
pub struct MemoryResourceStore {
    inner: Arc<MemoryStoreInner>,
}

impl std::fmt::Debug for MemoryResourceStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("MemoryResourceStore")
            .field("nodes", &self.inner.nodes.read().len())
            .field("pending_events", &self.inner.pending_events.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Default for MemoryResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(MemoryStoreInner {
                nodes: RwLock::new(BTreeMap::new()),
                handlers: RwLock::new(HashMap::new()),
                faults: Mutex::new(Vec::new()),
                event_tx,
                event_rx: Mutex::new(Some(event_rx)),
                pending_events: AtomicUsize::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Spawns the event dispatcher on the current tokio runtime.
    ///
    /// Calling `start()` when a dispatcher is already running is a no-op.
    pub fn start(&self) {
        let Some(mut receiver) = self.inner.event_rx.lock().take() else {
            return;
        };
        let inner = Arc::clone(&self.inner);
        let shutdown = self.inner.shutdown.clone();

        tokio::spawn(async move {
            debug!("store event dispatcher started");
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        debug!("store event dispatcher received shutdown signal");
                        break;
                    }
                    event = receiver.recv() => {
                        match event {
                            Some(event) => inner.dispatch(event),
                            None => break,
                        }
                    }
                }
            }
            debug!("store event dispatcher stopped");
        });
    }

    /// Stops the dispatcher; queued events are dropped.
    pub fn stop(&self) {
        self.inner.shutdown.cancel();
    }

    /// Waits until every queued event has been delivered, including events
    /// emitted by handlers while delivering earlier ones.
    pub async fn wait_idle(&self) {
        while self.inner.pending_events.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Fails the next matching operation with `error`.
    pub fn fail_next(
        &self,
        op: StoreOp,
        path: Option<ResourcePath>,
        error: StoreError,
    ) {
        self.inner.faults.lock().push(Fault {
            op,
            path,
            error,
            remaining: Some(1),
        });
    }

    /// Fails every matching operation with `error` until [`Self::clear_faults`].
    pub fn fail_always(
        &self,
        op: StoreOp,
        path: Option<ResourcePath>,
        error: StoreError,
    ) {
        self.inner.faults.lock().push(Fault {
            op,
            path,
            error,
            remaining: None,
        });
    }

    pub fn clear_faults(&self) {
        self.inner.faults.lock().clear();
    }

    pub fn contains(
        &self,
        path: &ResourcePath,
    ) -> bool {
        self.inner.nodes.read().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.inner.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceStore for MemoryResourceStore {
    fn get(
        &self,
        path: &ResourcePath,
    ) -> StoreResult<Resource> {
        self.inner.check_fault(StoreOp::Get, path)?;
        self.inner
            .nodes
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { path: path.clone() })
    }

    fn add(
        &self,
        mut resource: Resource,
    ) -> StoreResult<Resource> {
        let path = resource.path.clone();
        self.inner.check_fault(StoreOp::Add, &path)?;

        let mut nodes = self.inner.nodes.write();
        if nodes.contains_key(&path) {
            return Err(StoreError::AlreadyExists { path });
        }
        match path.parent() {
            Some(parent) if parent.is_root() || nodes.contains_key(&parent) => {}
            _ => return Err(StoreError::MissingParent { path }),
        }

        resource.meta.key = crate::StorageKey(nanoid!());
        resource.meta.uid = nanoid!();
        resource.meta.version = 1;
        resource.meta.deletion_requested = false;

        nodes.insert(path.clone(), resource.clone());
        trace!(path = %path, key = %resource.meta.key, "resource added");
        self.inner.emit(StoreEvent::Add(resource.clone()));
        Ok(resource)
    }

    fn update(
        &self,
        mut resource: Resource,
    ) -> StoreResult<Resource> {
        let path = resource.path.clone();
        self.inner.check_fault(StoreOp::Update, &path)?;

        let mut nodes = self.inner.nodes.write();
        let current = nodes
            .get(&path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { path: path.clone() })?;
        if current.meta.version != resource.meta.version {
            return Err(StoreError::Conflict {
                path,
                expected: resource.meta.version,
                actual: current.meta.version,
            });
        }

        // Identity and the soft-delete marker are store-managed
        resource.meta.key = current.meta.key.clone();
        resource.meta.uid = current.meta.uid.clone();
        resource.meta.deletion_requested = current.meta.deletion_requested;
        resource.meta.version = current.meta.version + 1;

        nodes.insert(path.clone(), resource.clone());
        if resource.meta.deletion_requested && resource.meta.finalizers.is_empty() {
            if MemoryStoreInner::is_removable(&nodes, &path) {
                self.inner.reap(&mut nodes, &path);
                return Ok(resource);
            }
            trace!(path = %path, "finalizers released, waiting for finalized descendants");
        }

        self.inner.emit(StoreEvent::Update(current, resource.clone()));
        Ok(resource)
    }

    fn delete(
        &self,
        path: &ResourcePath,
    ) -> StoreResult<()> {
        self.inner.check_fault(StoreOp::Delete, path)?;

        let mut nodes = self.inner.nodes.write();
        let current = nodes
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { path: path.clone() })?;

        if current.meta.finalizers.is_empty() && !MemoryStoreInner::has_finalized_descendant(&nodes, path) {
            self.inner.remove_subtree(&mut nodes, path);
            return Ok(());
        }

        self.inner.request_deletion(&mut nodes, path);
        Ok(())
    }

    fn get_parent(
        &self,
        resource: &Resource,
    ) -> StoreResult<Resource> {
        let parent = resource.path.parent().unwrap_or_default();
        self.get(&parent)
    }

    fn list_children(
        &self,
        parent: &ResourcePath,
        kind: ResourceKind,
    ) -> StoreResult<Vec<Resource>> {
        self.inner.check_fault(StoreOp::ListChildren, parent)?;

        let nodes = self.inner.nodes.read();
        if !parent.is_root() && !nodes.contains_key(parent) {
            return Err(StoreError::NotFound { path: parent.clone() });
        }
        Ok(nodes
            .values()
            .filter(|r| r.kind() == Some(kind) && r.path.parent().as_ref() == Some(parent))
            .cloned()
            .collect())
    }

    fn subscribe(
        &self,
        kind: ResourceKind,
        handler: Arc<dyn ResourceEventHandler>,
    ) {
        self.inner.handlers.write().entry(kind).or_default().push(handler);
    }
}
