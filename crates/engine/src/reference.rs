//! Read-through cache for reference lists (brands, channels, cities) shared by
//! several forms.
use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, PoisonError, RwLock},
};

use api_types::reference::{RefItem, RefKey};
use tokio::sync::Mutex;

use crate::ServiceError;

pub trait ReferenceLoader {
    fn load(&self, key: RefKey) -> impl Future<Output = Result<Vec<RefItem>, ServiceError>> + Send;
}

#[derive(Default)]
struct Slot {
    /// Held for the whole duration of a load, so concurrent callers queue
    /// behind it instead of fetching again.
    gate: Mutex<()>,
    items: RwLock<Arc<[RefItem]>>,
}

impl Slot {
    fn snapshot(&self) -> Arc<[RefItem]> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, items: Vec<RefItem>) -> Arc<[RefItem]> {
        let items: Arc<[RefItem]> = items.into();
        *self.items.write().unwrap_or_else(PoisonError::into_inner) = items.clone();
        items
    }
}

pub struct ReferenceCache<L> {
    loader: L,
    slots: HashMap<RefKey, Slot>,
}

impl<L: ReferenceLoader> ReferenceCache<L> {
    pub fn new(loader: L) -> Self {
        let slots = RefKey::ALL
            .into_iter()
            .map(|key| (key, Slot::default()))
            .collect();
        Self { loader, slots }
    }

    fn slot(&self, key: RefKey) -> &Slot {
        // Every key is seeded in `new`.
        &self.slots[&key]
    }

    /// Current items without blocking; empty until the first load completes.
    pub fn current(&self, key: RefKey) -> Arc<[RefItem]> {
        self.slot(key).snapshot()
    }

    /// Loads `key` if it is empty. Concurrent callers share a single fetch.
    pub async fn ensure_loaded(&self, key: RefKey) -> Result<Arc<[RefItem]>, ServiceError> {
        let slot = self.slot(key);
        let items = slot.snapshot();
        if !items.is_empty() {
            return Ok(items);
        }

        let _guard = slot.gate.lock().await;
        // Another caller may have finished loading while we waited.
        let items = slot.snapshot();
        if !items.is_empty() {
            return Ok(items);
        }

        tracing::debug!("loading reference list {key}");
        let loaded = self.loader.load(key).await?;
        Ok(slot.store(loaded))
    }

    /// Reloads `key` unconditionally.
    pub async fn force_refresh(&self, key: RefKey) -> Result<Arc<[RefItem]>, ServiceError> {
        let slot = self.slot(key);
        let _guard = slot.gate.lock().await;
        tracing::debug!("refreshing reference list {key}");
        let loaded = self.loader.load(key).await?;
        Ok(slot.store(loaded))
    }
}
