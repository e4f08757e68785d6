//! Per-provider cache of type maps.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::core::{BindableType, Shape};

use super::type_map::TypeMap;

/// Result of registering a type.
#[derive(Debug, Clone)]
pub struct Registration {
    pub map: Arc<TypeMap>,
    /// `true` only for the call that created the map.
    pub newly_registered: bool,
}

/// Type maps keyed by type, built at most once per type.
#[derive(Debug, Default)]
pub struct TypeMapCache {
    maps: DashMap<TypeId, Arc<TypeMap>>,
}

impl TypeMapCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the map for `shape`, building and publishing it on first use.
    ///
    /// Concurrent first uses of the same type observe a single map, and
    /// exactly one of them sees `newly_registered`.
    pub fn get_or_register(&self, shape: &'static Shape) -> Registration {
        if let Some(existing) = self.maps.get(&shape.type_id()) {
            return Registration {
                map: Arc::clone(existing.value()),
                newly_registered: false,
            };
        }

        match self.maps.entry(shape.type_id()) {
            Entry::Occupied(e) => Registration {
                map: Arc::clone(e.get()),
                newly_registered: false,
            },
            Entry::Vacant(e) => {
                let map = Arc::new(TypeMap::new(shape));
                e.insert(Arc::clone(&map));
                debug!(type_name = shape.type_name(), "registered type map");
                Registration {
                    map,
                    newly_registered: true,
                }
            }
        }
    }

    pub fn register<T: BindableType>(&self) -> Registration {
        self.get_or_register(T::type_shape())
    }

    pub fn get(&self, type_id: TypeId) -> Option<Arc<TypeMap>> {
        self.maps.get(&type_id).map(|m| Arc::clone(m.value()))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.maps.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
