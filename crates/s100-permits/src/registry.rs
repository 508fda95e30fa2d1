//! Manufacturer lookup.
//!
//! A permit file names its device's manufacturer only by M_ID. Reading one
//! requires a [`ManufacturerLookup`] to find the M_KEY for that id.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use s100_core::Manufacturer;

/// Resolves a manufacturer id to its [`Manufacturer`].
pub trait ManufacturerLookup {
    /// The manufacturer for `m_id`, or `None` if it is unknown.
    fn manufacturer_for_id(&self, m_id: &str) -> Option<Manufacturer>;
}

impl<T: ManufacturerLookup + ?Sized> ManufacturerLookup for &T {
    fn manufacturer_for_id(&self, m_id: &str) -> Option<Manufacturer> {
        (**self).manufacturer_for_id(m_id)
    }
}

impl<T: ManufacturerLookup + ?Sized> ManufacturerLookup for Arc<T> {
    fn manufacturer_for_id(&self, m_id: &str) -> Option<Manufacturer> {
        (**self).manufacturer_for_id(m_id)
    }
}

impl ManufacturerLookup for HashMap<String, Manufacturer> {
    fn manufacturer_for_id(&self, m_id: &str) -> Option<Manufacturer> {
        self.get(m_id).cloned()
    }
}

/// In-memory manufacturer registry.
///
/// Thread-safe via RwLock; lookups clone the entry out.
#[derive(Debug, Default)]
pub struct ManufacturerRegistry {
    inner: RwLock<HashMap<String, Manufacturer>>,
}

impl ManufacturerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manufacturer, returning the entry it replaced.
    pub fn register(&self, manufacturer: Manufacturer) -> Option<Manufacturer> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.insert(manufacturer.id().to_string(), manufacturer)
    }

    pub fn remove(&self, m_id: &str) -> Option<Manufacturer> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.remove(m_id)
    }

    pub fn contains(&self, m_id: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.contains_key(m_id)
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = inner.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl ManufacturerLookup for ManufacturerRegistry {
    fn manufacturer_for_id(&self, m_id: &str) -> Option<Manufacturer> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.get(m_id).cloned()
    }
}

impl FromIterator<Manufacturer> for ManufacturerRegistry {
    fn from_iter<I: IntoIterator<Item = Manufacturer>>(iter: I) -> Self {
        let registry = Self::new();
        for m in iter {
            registry.register(m);
        }
        registry
    }
}
