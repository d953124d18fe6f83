//! Scene: the component/line store and its registry bookkeeping.

use crate::component::{Component, ComponentId, Direction, ConnectionPoint, PointId};
use crate::geometry::clamp_to_canvas;
use crate::line::{ConnectionLine, LineId};
use crate::registry::PointRegistry;
use kurbo::{Point, Rect};
use std::collections::HashMap;

/// The complete in-memory graph of components and lines for one editor
/// instance.
///
/// Components and lines are only added and removed through this store;
/// every mutation path keeps the point registry consistent and raises a
/// single coalesced redraw request.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    components: HashMap<ComponentId, Component>,
    /// Back-to-front draw and hit-test order, equal to insertion order
    /// unless explicitly reordered.
    z_order: Vec<ComponentId>,
    lines: Vec<ConnectionLine>,
    registry: PointRegistry,
    needs_redraw: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component, registering all its connection points.
    pub fn add_component(&mut self, component: Component) -> ComponentId {
        let id = component.id;
        self.registry.register_component(&component);
        self.z_order.push(id);
        self.components.insert(id, component);
        self.request_redraw();
        id
    }

    /// Remove a component, unregistering its points and detaching any
    /// lines wired to them.
    pub fn remove_component(&mut self, id: ComponentId) -> Option<Component> {
        let component = self.components.remove(&id)?;
        self.z_order.retain(|&cid| cid != id);
        self.registry.unregister_owner(id);

        // Detach lines referencing the removed points, freeing the
        // surviving endpoints.
        let detached: Vec<LineId> = self
            .lines
            .iter()
            .filter(|line| {
                self.registry.resolve(line.start_point).is_none()
                    || self.registry.resolve(line.end_point).is_none()
            })
            .map(|line| line.id)
            .collect();
        for line_id in detached {
            self.remove_line(line_id);
        }

        self.request_redraw();
        Some(component)
    }

    /// Add a line between two registered connection points.
    ///
    /// Returns `None` without mutating anything if either endpoint does
    /// not resolve, the direction pair is not output→input, both points
    /// belong to the same component, or either point is already wired.
    pub fn add_line(&mut self, line: ConnectionLine) -> Option<LineId> {
        let Some(start) = self.registry.resolve(line.start_point) else {
            log::warn!("skipping line {}: start point does not resolve", line.id);
            return None;
        };
        let Some(end) = self.registry.resolve(line.end_point) else {
            log::warn!("skipping line {}: end point does not resolve", line.id);
            return None;
        };
        if start.direction != Direction::Output || end.direction != Direction::Input {
            log::warn!("skipping line {}: endpoints are not output→input", line.id);
            return None;
        }
        if start.component == end.component {
            log::warn!("skipping line {}: endpoints share a component", line.id);
            return None;
        }
        let available = |scene: &Scene, pid: PointId| {
            scene.resolve_point(pid).map(|p| p.available).unwrap_or(false)
        };
        if !available(self, line.start_point) || !available(self, line.end_point) {
            log::warn!("skipping line {}: endpoint already wired", line.id);
            return None;
        }

        let id = line.id;
        self.set_point_available(line.start_point, false);
        self.set_point_available(line.end_point, false);
        self.lines.push(line);
        self.request_redraw();
        Some(id)
    }

    /// Remove a line, freeing its endpoints.
    pub fn remove_line(&mut self, id: LineId) -> Option<ConnectionLine> {
        let index = self.lines.iter().position(|l| l.id == id)?;
        let line = self.lines.remove(index);
        self.set_point_available(line.start_point, true);
        self.set_point_available(line.end_point, true);
        self.request_redraw();
        Some(line)
    }

    /// Clear all components and lines (wholesale, on load).
    pub fn clear(&mut self) {
        self.components.clear();
        self.z_order.clear();
        self.lines.clear();
        self.registry.clear();
        self.request_redraw();
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(&id)
    }

    pub fn line(&self, id: LineId) -> Option<&ConnectionLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn line_mut(&mut self, id: LineId) -> Option<&mut ConnectionLine> {
        self.lines.iter_mut().find(|l| l.id == id)
    }

    /// Components in z-order (back to front), read-only.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.z_order.iter().filter_map(|id| self.components.get(id))
    }

    /// The z-order list itself (back to front).
    pub fn z_order(&self) -> &[ComponentId] {
        &self.z_order
    }

    /// Lines in insertion order, read-only.
    pub fn lines(&self) -> &[ConnectionLine] {
        &self.lines
    }

    pub fn registry(&self) -> &PointRegistry {
        &self.registry
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.lines.is_empty()
    }

    /// Bring a component to the front of the z-order (remove + re-add).
    pub fn bring_to_front(&mut self, id: ComponentId) {
        if self.components.contains_key(&id) {
            self.z_order.retain(|&cid| cid != id);
            self.z_order.push(id);
            self.request_redraw();
        }
    }

    /// Send a component to the back of the z-order.
    pub fn send_to_back(&mut self, id: ComponentId) {
        if self.components.contains_key(&id) {
            self.z_order.retain(|&cid| cid != id);
            self.z_order.insert(0, id);
            self.request_redraw();
        }
    }

    /// Move a component, clamped to non-negative canvas coordinates.
    pub fn move_component(&mut self, id: ComponentId, position: Point) {
        if let Some(component) = self.components.get_mut(&id) {
            component.move_to(clamp_to_canvas(position));
            self.request_redraw();
        }
    }

    /// Re-register a component's points after family logic resized its
    /// point lists. Lines wired to dropped points are detached.
    pub fn sync_component_points(&mut self, id: ComponentId) {
        if let Some(component) = self.components.get(&id) {
            self.registry.register_component(component);
        }
        let dangling: Vec<LineId> = self
            .lines
            .iter()
            .filter(|line| {
                self.registry.resolve(line.start_point).is_none()
                    || self.registry.resolve(line.end_point).is_none()
            })
            .map(|line| line.id)
            .collect();
        for line_id in dangling {
            self.remove_line(line_id);
        }
        self.request_redraw();
    }

    /// Resolve a point identifier through the registry to the live point.
    pub fn resolve_point(&self, id: PointId) -> Option<&ConnectionPoint> {
        let loc = self.registry.resolve(id)?;
        self.components.get(&loc.component)?.point(id)
    }

    /// The owning component of a point, if registered.
    pub fn point_owner(&self, id: PointId) -> Option<ComponentId> {
        self.registry.owner_of(id)
    }

    fn set_point_available(&mut self, id: PointId, available: bool) {
        if let Some(loc) = self.registry.resolve(id) {
            if let Some(component) = self.components.get_mut(&loc.component) {
                if let Some(point) = component.point_mut(id) {
                    point.available = available;
                }
            }
        }
    }

    /// Route polyline for a line, if both endpoints resolve.
    pub fn line_route(&self, line: &ConnectionLine) -> Option<Vec<Point>> {
        let start = self.resolve_point(line.start_point)?.center;
        let end = self.resolve_point(line.end_point)?.center;
        Some(line.route_points(start, end))
    }

    /// The topmost visible component at a world position.
    pub fn component_at(&self, position: Point) -> Option<ComponentId> {
        self.z_order
            .iter()
            .rev()
            .filter_map(|id| self.components.get(id))
            .find(|c| c.visible && c.hit_test(position))
            .map(|c| c.id)
    }

    /// Union of all component bounds.
    pub fn bounds(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for component in self.components.values() {
            let bounds = component.bounds();
            result = Some(match result {
                Some(r) => r.union(bounds),
                None => bounds,
            });
        }
        result
    }

    /// Request a repaint; requests coalesce until taken.
    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Consume the pending redraw request, if any.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }
}
