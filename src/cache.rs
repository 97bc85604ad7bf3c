//! Element cache
//!
//! Bounded, time-expiring LRU maps from element id to element handle, one
//! per element type. Entries are soft state: a miss says nothing about
//! whether the element exists.

use crate::config::CacheConfig;
use crate::element::{Edge, ElementId, ElementKind, Vertex};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct CachedEntry<T> {
    element: T,
    inserted: Instant,
}

/// LRU cache for one element type
#[derive(Debug)]
pub struct ElementCache<T> {
    entries: Option<Mutex<LruCache<ElementId, CachedEntry<T>>>>,
    timeout: Option<Duration>,
}

impl<T: Clone> ElementCache<T> {
    pub fn new(config: &CacheConfig) -> Self {
        let entries = if config.enabled {
            NonZeroUsize::new(config.capacity).map(|cap| Mutex::new(LruCache::new(cap)))
        } else {
            None
        };
        Self {
            entries,
            timeout: config.timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn disabled() -> Self {
        Self {
            entries: None,
            timeout: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    fn lock(&self) -> Option<MutexGuard<'_, LruCache<ElementId, CachedEntry<T>>>> {
        self.entries
            .as_ref()
            .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Insert or replace
    pub fn cache(&self, id: ElementId, element: T) {
        if let Some(mut entries) = self.lock() {
            entries.put(
                id,
                CachedEntry {
                    element,
                    inserted: Instant::now(),
                },
            );
        }
    }

    /// Cached handle, unless absent or expired
    pub fn retrieve(&self, id: &ElementId) -> Option<T> {
        let mut entries = self.lock()?;
        let expired = match entries.get(id) {
            Some(entry) => self
                .timeout
                .map(|timeout| entry.inserted.elapsed() >= timeout)
                .unwrap_or(false),
            None => return None,
        };
        if expired {
            entries.pop(id);
            return None;
        }
        entries.get(id).map(|entry| entry.element.clone())
    }

    pub fn remove(&self, id: &ElementId) {
        if let Some(mut entries) = self.lock() {
            entries.pop(id);
        }
    }

    pub fn clear(&self) {
        if let Some(mut entries) = self.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Vertex and edge caches of one graph instance
#[derive(Debug)]
pub struct ElementCaches {
    vertices: ElementCache<Vertex>,
    edges: ElementCache<Edge>,
}

impl ElementCaches {
    pub fn new(vertex_config: &CacheConfig, edge_config: &CacheConfig) -> Self {
        Self {
            vertices: ElementCache::new(vertex_config),
            edges: ElementCache::new(edge_config),
        }
    }

    pub fn vertices(&self) -> &ElementCache<Vertex> {
        &self.vertices
    }

    pub fn edges(&self) -> &ElementCache<Edge> {
        &self.edges
    }

    pub fn remove(&self, id: &ElementId, kind: ElementKind) {
        match kind {
            ElementKind::Vertex => self.vertices.remove(id),
            ElementKind::Edge => self.edges.remove(id),
        }
    }

    pub fn clear(&self, kind: ElementKind) {
        match kind {
            ElementKind::Vertex => self.vertices.clear(),
            ElementKind::Edge => self.edges.clear(),
        }
    }

    pub fn clear_all(&self) {
        self.vertices.clear();
        self.edges.clear();
    }
}
