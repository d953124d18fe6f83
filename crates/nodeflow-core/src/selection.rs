//! Selection state for components and lines.
//!
//! The selection manager only reacts to already-resolved interaction
//! events; it never performs hit-testing of its own.

use crate::component::ComponentId;
use crate::interaction::{EventKind, EventTarget, Handled, InteractionEvent, InteractionHandler, MouseButton};
use crate::line::LineId;
use crate::scene::Scene;

/// A selectable scene element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneTarget {
    Component(ComponentId),
    Line(LineId),
}

/// Tracks the set of selected components and lines.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    /// Selected targets, in selection order, without duplicates.
    targets: Vec<SceneTarget>,
    /// Anchor for range selection: the last singly-selected component.
    anchor: Option<ComponentId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a single target, clearing the prior selection.
    pub fn select_single(&mut self, target: SceneTarget) {
        self.targets.clear();
        self.targets.push(target);
        if let SceneTarget::Component(id) = target {
            self.anchor = Some(id);
        }
    }

    /// Toggle a target's membership (modifier-key multi-select).
    pub fn toggle(&mut self, target: SceneTarget) {
        if let Some(pos) = self.targets.iter().position(|&t| t == target) {
            self.targets.remove(pos);
        } else {
            self.targets.push(target);
            if let SceneTarget::Component(id) = target {
                self.anchor = Some(id);
            }
        }
    }

    /// Select the inclusive range of components between `from` and `to`
    /// in the scene's current z-order. No-op if either end is not in the
    /// z-order.
    pub fn select_range(&mut self, from: ComponentId, to: ComponentId, scene: &Scene) {
        let z_order = scene.z_order();
        let Some(a) = z_order.iter().position(|&id| id == from) else {
            return;
        };
        let Some(b) = z_order.iter().position(|&id| id == to) else {
            return;
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        self.targets.clear();
        for &id in &z_order[lo..=hi] {
            self.targets.push(SceneTarget::Component(id));
        }
    }

    pub fn clear(&mut self) {
        self.targets.clear();
    }

    /// Select every component in z-order.
    pub fn select_all(&mut self, scene: &Scene) {
        self.targets.clear();
        for &id in scene.z_order() {
            self.targets.push(SceneTarget::Component(id));
        }
        for line in scene.lines() {
            self.targets.push(SceneTarget::Line(line.id));
        }
    }

    pub fn is_selected(&self, target: SceneTarget) -> bool {
        self.targets.contains(&target)
    }

    pub fn targets(&self) -> &[SceneTarget] {
        &self.targets
    }

    /// Selected component ids, in selection order.
    pub fn components(&self) -> Vec<ComponentId> {
        self.targets
            .iter()
            .filter_map(|t| match t {
                SceneTarget::Component(id) => Some(*id),
                SceneTarget::Line(_) => None,
            })
            .collect()
    }

    /// Selected line ids, in selection order.
    pub fn lines(&self) -> Vec<LineId> {
        self.targets
            .iter()
            .filter_map(|t| match t {
                SceneTarget::Line(id) => Some(*id),
                SceneTarget::Component(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Remove a target from the selection. Called atomically with its
    /// removal from the store so no dangling references survive.
    pub fn remove(&mut self, target: SceneTarget) {
        self.targets.retain(|&t| t != target);
        if let SceneTarget::Component(id) = target {
            if self.anchor == Some(id) {
                self.anchor = None;
            }
        }
    }

    /// Drop any target no longer present in the scene.
    pub fn prune(&mut self, scene: &Scene) {
        self.targets.retain(|t| match t {
            SceneTarget::Component(id) => scene.component(*id).is_some(),
            SceneTarget::Line(id) => scene.line(*id).is_some(),
        });
        if let Some(anchor) = self.anchor {
            if scene.component(anchor).is_none() {
                self.anchor = None;
            }
        }
    }

    /// Mirror the selection onto the lines' highlight flags.
    pub fn sync_highlights(&self, scene: &mut Scene) {
        let selected = self.lines();
        let mut changed = false;
        for id in scene.lines().iter().map(|l| l.id).collect::<Vec<_>>() {
            let want = selected.contains(&id);
            if let Some(line) = scene.line_mut(id) {
                if line.selected != want {
                    line.selected = want;
                    changed = true;
                }
            }
        }
        if changed {
            scene.request_redraw();
        }
    }
}

impl InteractionHandler for SelectionManager {
    /// React to resolved click events: plain click selects singly,
    /// ctrl/meta toggles, shift extends a component range from the
    /// anchor, canvas click clears.
    fn on_event(&mut self, scene: &mut Scene, event: &InteractionEvent) -> Handled {
        let EventKind::Click(button) = event.kind else {
            return Handled::No;
        };

        match (event.target, button) {
            (EventTarget::Component(id), MouseButton::Left) => {
                if event.modifiers.shift {
                    if let Some(anchor) = self.anchor {
                        self.select_range(anchor, id, scene);
                    } else {
                        self.select_single(SceneTarget::Component(id));
                    }
                } else if event.modifiers.ctrl || event.modifiers.meta {
                    self.toggle(SceneTarget::Component(id));
                } else {
                    self.select_single(SceneTarget::Component(id));
                }
            }
            (EventTarget::Line(id), MouseButton::Left) => {
                if event.modifiers.ctrl || event.modifiers.meta {
                    self.toggle(SceneTarget::Line(id));
                } else {
                    self.select_single(SceneTarget::Line(id));
                }
            }
            (EventTarget::Component(id), MouseButton::Right) => {
                // Context clicks select their target if not yet selected.
                if !self.is_selected(SceneTarget::Component(id)) {
                    self.select_single(SceneTarget::Component(id));
                }
            }
            (EventTarget::Line(id), MouseButton::Right) => {
                if !self.is_selected(SceneTarget::Line(id)) {
                    self.select_single(SceneTarget::Line(id));
                }
            }
            (EventTarget::Canvas, MouseButton::Left) => {
                self.clear();
            }
            _ => return Handled::No,
        }

        self.sync_highlights(scene);
        Handled::Yes
    }
}
