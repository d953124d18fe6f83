//! Connection point registry: the single source of truth for resolving
//! point identifiers to their location and owning component.

use crate::component::{Component, ComponentId, Direction, PointId};
use std::collections::HashMap;

/// Where a registered point lives: its owner plus the position inside
/// the owner's point lists. The registry is a lookup index and holds no
/// point data of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointLocation {
    pub component: ComponentId,
    pub direction: Direction,
    pub index: usize,
}

/// O(1) index from point identifier to owning component.
///
/// One registry instance is owned by each scene; it is constructed with
/// the scene and torn down with it.
#[derive(Debug, Clone, Default)]
pub struct PointRegistry {
    entries: HashMap<PointId, PointLocation>,
}

impl PointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single point. Idempotent: re-registering an identifier
    /// replaces the owner mapping without creating duplicates.
    pub fn register(&mut self, id: PointId, location: PointLocation) {
        self.entries.insert(id, location);
    }

    /// Register every connection point of a component, replacing any
    /// stale entries for that component.
    pub fn register_component(&mut self, component: &Component) {
        self.unregister_owner(component.id);
        for point in component.points() {
            self.register(
                point.id,
                PointLocation {
                    component: component.id,
                    direction: point.direction,
                    index: point.index,
                },
            );
        }
    }

    /// Remove a single point.
    pub fn unregister(&mut self, id: PointId) -> Option<PointLocation> {
        self.entries.remove(&id)
    }

    /// Remove every point owned by a component, including points added
    /// after the component was first registered.
    pub fn unregister_owner(&mut self, component: ComponentId) {
        self.entries.retain(|_, loc| loc.component != component);
    }

    /// Resolve an identifier to its location. Unknown identifiers return
    /// `None`; this happens routinely for stale or out-of-order
    /// deserialized documents and callers skip the miss.
    pub fn resolve(&self, id: PointId) -> Option<PointLocation> {
        self.entries.get(&id).copied()
    }

    /// The owning component of a point, if registered.
    pub fn owner_of(&self, id: PointId) -> Option<ComponentId> {
        self.entries.get(&id).map(|loc| loc.component)
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
