//! Undo/redo history over labelled scene snapshots.
//!
//! A snapshot is simply a [`SceneDocument`], so restoring one exercises
//! the same identity-remap import path as loading a saved document.
//! Transient UI state (selection, hover) is not historied.

use crate::document::SceneDocument;
use crate::family::FamilyRegistry;
use crate::scene::Scene;

/// Maximum number of undo entries to keep.
pub const MAX_HISTORY: usize = 50;

/// A labelled snapshot of scene state.
#[derive(Debug, Clone)]
struct HistoryEntry {
    label: String,
    snapshot: SceneDocument,
}

/// Linear undo/redo manager.
#[derive(Debug, Clone, Default)]
pub struct HistoryManager {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pre-mutation state of the scene. Call before a
    /// mutating operation begins; any recorded mutation clears the redo
    /// stack.
    pub fn record_state(&mut self, label: impl Into<String>, scene: &Scene) {
        self.record_snapshot(label, SceneDocument::export(scene));
    }

    /// Record a snapshot captured earlier. Used when the pre-mutation
    /// state was exported before the mutation point was known, e.g. at
    /// pointer-press for a drag that only later crosses the tolerance.
    pub fn record_snapshot(&mut self, label: impl Into<String>, snapshot: SceneDocument) {
        self.undo_stack.push(HistoryEntry {
            label: label.into(),
            snapshot,
        });
        self.redo_stack.clear();

        if self.undo_stack.len() > MAX_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the most recent recorded mutation. Returns the entry label,
    /// or `None` if there was nothing to undo.
    pub fn undo(&mut self, scene: &mut Scene, families: &FamilyRegistry) -> Option<String> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(HistoryEntry {
            label: entry.label.clone(),
            snapshot: SceneDocument::export(scene),
        });
        entry.snapshot.import_into(scene, families);
        Some(entry.label)
    }

    /// Redo the most recently undone mutation. Returns the entry label,
    /// or `None` if there was nothing to redo.
    pub fn redo(&mut self, scene: &mut Scene, families: &FamilyRegistry) -> Option<String> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(HistoryEntry {
            label: entry.label.clone(),
            snapshot: SceneDocument::export(scene),
        });
        entry.snapshot.import_into(scene, families);
        Some(entry.label)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the next undo entry, for menu items.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.label.as_str())
    }

    /// Label of the next redo entry, for menu items.
    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.label.as_str())
    }

    /// Drop all history, e.g. after loading a new document.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::stock_registry;
    use kurbo::Point;

    fn scene_with_component(families: &FamilyRegistry) -> Scene {
        let mut scene = Scene::new();
        let mut c = families.create("process").unwrap();
        c.move_to(Point::new(100.0, 100.0));
        scene.add_component(c);
        scene
    }

    #[test]
    fn test_undo_restores_pre_mutation_state() {
        let families = stock_registry();
        let mut scene = scene_with_component(&families);
        let mut history = HistoryManager::new();
        let id = scene.components().next().unwrap().id;

        history.record_state("Move", &scene);
        scene.move_component(id, Point::new(300.0, 200.0));

        assert_eq!(history.undo(&mut scene, &families).as_deref(), Some("Move"));
        let component = scene.component(id).unwrap();
        assert_eq!(component.position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_redo_restores_post_mutation_state() {
        let families = stock_registry();
        let mut scene = scene_with_component(&families);
        let mut history = HistoryManager::new();
        let id = scene.components().next().unwrap().id;

        history.record_state("Move", &scene);
        scene.move_component(id, Point::new(300.0, 200.0));
        history.undo(&mut scene, &families);

        assert!(history.can_redo());
        history.redo(&mut scene, &families);
        assert_eq!(scene.component(id).unwrap().position, Point::new(300.0, 200.0));
        assert!(history.can_undo());
    }

    #[test]
    fn test_undo_restores_line_endpoints() {
        let families = stock_registry();
        let mut scene = Scene::new();
        let source = families.create("source").unwrap();
        let sink = families.create("sink").unwrap();
        let start = source.outputs[0].id;
        let end = sink.inputs[0].id;
        scene.add_component(source);
        let mut sink = sink;
        sink.move_to(Point::new(300.0, 0.0));
        scene.add_component(sink);

        let mut history = HistoryManager::new();
        history.record_state("Connect", &scene);
        scene
            .add_line(crate::line::ConnectionLine::new(start, end))
            .unwrap();

        history.undo(&mut scene, &families);
        assert_eq!(scene.line_count(), 0);
        assert!(scene.resolve_point(start).unwrap().available);

        history.redo(&mut scene, &families);
        assert_eq!(scene.line_count(), 1);
        assert_eq!(scene.lines()[0].start_point, start);
        assert!(!scene.resolve_point(end).unwrap().available);
    }

    #[test]
    fn test_new_mutation_clears_redo() {
        let families = stock_registry();
        let mut scene = scene_with_component(&families);
        let mut history = HistoryManager::new();
        let id = scene.components().next().unwrap().id;

        history.record_state("Move", &scene);
        scene.move_component(id, Point::new(300.0, 200.0));
        history.undo(&mut scene, &families);
        assert!(history.can_redo());

        history.record_state("Move again", &scene);
        scene.move_component(id, Point::new(10.0, 10.0));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let families = stock_registry();
        let mut scene = Scene::new();
        let mut history = HistoryManager::new();
        assert!(!history.can_undo());
        assert!(history.undo(&mut scene, &families).is_none());
        assert!(!history.can_redo());
        assert!(history.redo(&mut scene, &families).is_none());
    }

    #[test]
    fn test_history_depth_capped() {
        let families = stock_registry();
        let scene = scene_with_component(&families);
        let mut history = HistoryManager::new();
        for i in 0..(MAX_HISTORY + 10) {
            history.record_state(format!("Edit {i}"), &scene);
        }
        assert_eq!(history.undo_stack.len(), MAX_HISTORY);
        // Oldest entries fall off the bottom.
        assert_eq!(history.undo_stack[0].label, "Edit 10");
    }

    #[test]
    fn test_labels_exposed() {
        let families = stock_registry();
        let mut scene = scene_with_component(&families);
        let mut history = HistoryManager::new();
        history.record_state("Add component", &scene);
        assert_eq!(history.undo_label(), Some("Add component"));
        history.undo(&mut scene, &families);
        assert_eq!(history.redo_label(), Some("Add component"));
    }
}
