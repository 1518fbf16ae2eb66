// ── Concurrent entity collection ──
//
// Sharded storage keyed by internal id, with a secondary index on the
// vendor's external identifier and a snapshot for cheap full scans.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A concurrent collection for a single entity type.
///
/// Every mutation rebuilds the snapshot, so readers that need the full
/// set (`snapshot`) never hold a shard lock.
pub(crate) struct EntityCollection<K, T>
where
    K: Copy + Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Primary storage: internal id -> entity.
    by_id: DashMap<K, Arc<T>>,

    /// Secondary index: external id -> internal id.
    external_to_id: DashMap<String, K>,

    /// Reverse of `external_to_id` for stale-mapping cleanup.
    id_to_external: DashMap<K, String>,

    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<K, T> EntityCollection<K, T>
where
    K: Copy + Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_id: DashMap::new(),
            external_to_id: DashMap::new(),
            id_to_external: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or replace an entity. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, external_id: &str, id: K, entity: T) -> bool {
        // Drop the old external mapping if this id was indexed under another key.
        if let Some(old) = self.id_to_external.get(&id).map(|r| r.value().clone()) {
            if old != external_id {
                self.external_to_id.remove(&old);
            }
        }

        let is_new = self.by_id.insert(id, Arc::new(entity)).is_none();
        self.external_to_id.insert(external_id.to_owned(), id);
        self.id_to_external.insert(id, external_id.to_owned());

        self.rebuild_snapshot();
        is_new
    }

    pub(crate) fn get(&self, id: &K) -> Option<Arc<T>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn get_by_external(&self, external_id: &str) -> Option<Arc<T>> {
        let id = *self.external_to_id.get(external_id)?;
        self.get(&id)
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        // Collected while `send_modify` holds the channel lock, so the last
        // rebuild to publish always sees every insert that preceded it.
        self.snapshot.send_modify(|snap| {
            *snap = Arc::new(self.by_id.iter().map(|r| Arc::clone(r.value())).collect());
        });
    }
}
