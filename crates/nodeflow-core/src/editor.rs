//! Editor facade wiring the scene, camera, selection, history, and
//! interaction pipeline together behind one host-facing API.
//!
//! Hosts feed raw pointer callbacks in screen coordinates; the editor
//! translates through the camera, runs the pipeline, and routes the
//! resulting events to history recording and the selection handler.

use crate::camera::Camera;
use crate::component::{AttrValue, ComponentId, Direction, PointId};
use crate::document::{DocumentError, SceneDocument};
use crate::family::FamilyRegistry;
use crate::history::HistoryManager;
use crate::interaction::{
    dispatch_event, EventKind, EventTarget, InteractionPipeline, Modifiers, MouseButton,
};
use crate::line::{ConnectionLine, LineId};
use crate::scene::Scene;
use crate::selection::SelectionManager;
use kurbo::Point;

/// Wheel zoom step per scroll notch.
const ZOOM_STEP: f64 = 1.1;

/// One interactive diagram editor instance.
#[derive(Debug)]
pub struct Editor {
    /// Open for direct host mutation; hosts that remove components or
    /// lines directly must follow up with `selection.prune` (the editor
    /// also prunes before dispatching interaction events).
    pub scene: Scene,
    pub camera: Camera,
    pub selection: SelectionManager,
    families: FamilyRegistry,
    history: HistoryManager,
    pipeline: InteractionPipeline,
    /// Target of the most recent double-click, consumed by the host
    /// (typically to open an attribute inspector).
    activated: Option<EventTarget>,
    /// Scene state captured at pointer-press while a move drag is still
    /// possible; becomes the undo snapshot if the drag starts.
    pending_move: Option<SceneDocument>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// An editor over the stock family catalogue.
    pub fn new() -> Self {
        Self::with_families(FamilyRegistry::default())
    }

    pub fn with_families(families: FamilyRegistry) -> Self {
        Self {
            scene: Scene::new(),
            camera: Camera::new(),
            selection: SelectionManager::new(),
            families,
            history: HistoryManager::new(),
            pipeline: InteractionPipeline::new(),
            activated: None,
            pending_move: None,
        }
    }

    pub fn families(&self) -> &FamilyRegistry {
        &self.families
    }

    pub fn families_mut(&mut self) -> &mut FamilyRegistry {
        &mut self.families
    }

    // ---- pointer input (screen coordinates) ----

    pub fn pointer_down(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers) {
        let canvas = self.camera.screen_to_canvas(screen);
        let selected = self.selection.components();
        self.pipeline
            .pointer_down(&self.scene, canvas, button, modifiers, &selected);
        // Drag deltas land in the same frame the drag starts, so the
        // undo snapshot has to be taken now, at press time.
        self.pending_move = self
            .pipeline
            .press_may_move()
            .then(|| SceneDocument::export(&self.scene));
        self.process_events();
    }

    pub fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) {
        let canvas = self.camera.screen_to_canvas(screen);
        self.pipeline.pointer_move(&mut self.scene, canvas, modifiers);
        self.process_events();
    }

    pub fn pointer_up(&mut self, screen: Point, modifiers: Modifiers) {
        let canvas = self.camera.screen_to_canvas(screen);
        self.pipeline.pointer_up(&mut self.scene, canvas, modifiers);
        self.process_events();
        self.pending_move = None;
    }

    /// Wheel scroll zooms about the cursor.
    pub fn wheel(&mut self, screen: Point, notches: f64) {
        if notches == 0.0 {
            return;
        }
        let factor = ZOOM_STEP.powf(notches);
        self.camera.zoom_at(screen, factor);
        self.scene.request_redraw();
    }

    /// Drain pipeline events: history recording first, then dispatch to
    /// the selection handler.
    fn process_events(&mut self) {
        let events = self.pipeline.drain_events();
        if events.is_empty() {
            return;
        }
        // The host may have mutated the scene directly since the last
        // event; stale selection targets must not reach handlers.
        self.selection.prune(&self.scene);

        for event in events {
            match event.kind {
                EventKind::DragStarted => {
                    // The press-time snapshot predates the drag's first
                    // delta; fall back to the live scene if a host drove
                    // the pipeline without a press.
                    match self.pending_move.take() {
                        Some(snapshot) => self.history.record_snapshot("Move", snapshot),
                        None => self.history.record_state("Move", &self.scene),
                    }
                }
                EventKind::ConnectRequested { start, end } => {
                    self.history.record_state("Connect", &self.scene);
                    self.scene.add_line(ConnectionLine::new(start, end));
                }
                EventKind::DoubleClick => {
                    self.activated = Some(event.target);
                }
                _ => {}
            }
            dispatch_event(&mut self.scene, &event, &mut [&mut self.selection]);
        }
    }

    /// The most recent double-click target, if unconsumed.
    pub fn take_activated(&mut self) -> Option<EventTarget> {
        self.activated.take()
    }

    /// The currently hovered target.
    pub fn hovered(&self) -> Option<EventTarget> {
        self.pipeline.hovered()
    }

    /// An in-flight connection drag as (source point, cursor position in
    /// canvas coordinates), for preview rendering.
    pub fn connect_preview(&self) -> Option<(PointId, Point)> {
        self.pipeline.connect_preview()
    }

    // ---- editing operations ----

    /// Instantiate a family at a canvas position. Returns `None` for an
    /// unknown type tag.
    pub fn add_component(&mut self, type_tag: &str, position: Point) -> Option<ComponentId> {
        let mut component = self.families.create(type_tag)?;
        self.history
            .record_state(format!("Add {}", component.name), &self.scene);
        component.move_to(position);
        Some(self.scene.add_component(component))
    }

    /// Wire an output point to an input point, recording history.
    /// Returns `None` if the pair is not a valid connection.
    pub fn connect(&mut self, start: PointId, end: PointId) -> Option<LineId> {
        if !self.can_connect(start, end) {
            return None;
        }
        self.history.record_state("Connect", &self.scene);
        self.scene.add_line(ConnectionLine::new(start, end))
    }

    fn can_connect(&self, start: PointId, end: PointId) -> bool {
        let (Some(s), Some(e)) = (
            self.scene.resolve_point(start),
            self.scene.resolve_point(end),
        ) else {
            return false;
        };
        s.direction == Direction::Output
            && e.direction == Direction::Input
            && s.available
            && e.available
            && self.scene.point_owner(start) != self.scene.point_owner(end)
    }

    /// Delete every selected component and line.
    pub fn remove_selected(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        self.history.record_state("Delete", &self.scene);

        // Lines first; removing a component then detaches only the
        // unselected lines still wired to it.
        for id in self.selection.lines() {
            self.scene.remove_line(id);
        }
        for id in self.selection.components() {
            self.scene.remove_component(id);
        }
        self.selection.clear();
        self.selection.sync_highlights(&mut self.scene);
    }

    /// Set one attribute on a component, recording history. Returns
    /// false if the component does not exist.
    pub fn set_attribute(&mut self, id: ComponentId, key: &str, value: AttrValue) -> bool {
        if self.scene.component(id).is_none() {
            return false;
        }
        self.history.record_state("Edit attribute", &self.scene);
        if let Some(component) = self.scene.component_mut(id) {
            component.attributes.insert(key.to_string(), value);
        }
        self.scene.request_redraw();
        true
    }

    // ---- history ----

    pub fn undo(&mut self) -> Option<String> {
        let label = self.history.undo(&mut self.scene, &self.families)?;
        self.selection.prune(&self.scene);
        self.selection.sync_highlights(&mut self.scene);
        Some(label)
    }

    pub fn redo(&mut self) -> Option<String> {
        let label = self.history.redo(&mut self.scene, &self.families)?;
        self.selection.prune(&self.scene);
        self.selection.sync_highlights(&mut self.scene);
        Some(label)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.history.undo_label()
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.history.redo_label()
    }

    // ---- persistence ----

    pub fn to_json(&self) -> Result<String, DocumentError> {
        SceneDocument::export(&self.scene).to_json()
    }

    /// Load a document, replacing the scene. History and selection are
    /// reset; they would otherwise reference the previous scene.
    pub fn load_json(&mut self, json: &str) -> Result<(), DocumentError> {
        let doc = SceneDocument::from_json(json)?;
        doc.import_into(&mut self.scene, &self.families);
        self.history.clear();
        self.selection.clear();
        self.activated = None;
        Ok(())
    }

    /// Coalesced redraw flag, cleared by the read.
    pub fn take_redraw(&mut self) -> bool {
        self.scene.take_redraw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SceneTarget as Target;

    fn no_mods() -> Modifiers {
        Modifiers::default()
    }

    fn click(editor: &mut Editor, at: Point) {
        editor.pointer_down(at, MouseButton::Left, no_mods());
        editor.pointer_up(at, no_mods());
    }

    fn drag(editor: &mut Editor, from: Point, to: Point) {
        editor.pointer_down(from, MouseButton::Left, no_mods());
        editor.pointer_move(to, no_mods());
        editor.pointer_move(to, no_mods());
        editor.pointer_up(to, no_mods());
    }

    /// Source at (0,0) wired-ready to a sink at (300,0).
    fn two_component_editor() -> (Editor, ComponentId, ComponentId) {
        let mut editor = Editor::new();
        let source = editor.add_component("source", Point::new(0.0, 0.0)).unwrap();
        let sink = editor.add_component("sink", Point::new(300.0, 0.0)).unwrap();
        (editor, source, sink)
    }

    fn output_center(editor: &Editor, id: ComponentId) -> Point {
        editor.scene.component(id).unwrap().outputs[0].center
    }

    fn input_center(editor: &Editor, id: ComponentId) -> Point {
        editor.scene.component(id).unwrap().inputs[0].center
    }

    #[test]
    fn test_add_component_unknown_tag() {
        let mut editor = Editor::new();
        assert!(editor.add_component("teleporter", Point::ZERO).is_none());
        assert!(editor.scene.is_empty());
    }

    #[test]
    fn test_click_selects_and_canvas_click_clears() {
        let (mut editor, source, _) = two_component_editor();

        click(&mut editor, Point::new(50.0, 30.0));
        assert!(editor.selection.is_selected(Target::Component(source)));

        click(&mut editor, Point::new(900.0, 900.0));
        assert!(editor.selection.is_empty());
    }

    #[test]
    fn test_drag_then_undo_restores_position() {
        let (mut editor, source, _) = two_component_editor();

        drag(&mut editor, Point::new(50.0, 30.0), Point::new(150.0, 130.0));
        assert_eq!(
            editor.scene.component(source).unwrap().position,
            Point::new(100.0, 100.0)
        );

        assert_eq!(editor.undo().as_deref(), Some("Move"));
        assert_eq!(
            editor.scene.component(source).unwrap().position,
            Point::new(0.0, 0.0)
        );

        editor.redo();
        assert_eq!(
            editor.scene.component(source).unwrap().position,
            Point::new(100.0, 100.0)
        );
    }

    #[test]
    fn test_minimal_drag_moves_and_undoes() {
        // down → one move → up: the component follows the delta, and the
        // recorded snapshot still holds the pre-drag position.
        let (mut editor, source, _) = two_component_editor();

        editor.pointer_down(Point::new(50.0, 30.0), MouseButton::Left, no_mods());
        editor.pointer_move(Point::new(150.0, 130.0), no_mods());
        editor.pointer_up(Point::new(150.0, 130.0), no_mods());

        assert_eq!(
            editor.scene.component(source).unwrap().position,
            Point::new(100.0, 100.0)
        );
        assert_eq!(editor.undo().as_deref(), Some("Move"));
        assert_eq!(
            editor.scene.component(source).unwrap().position,
            Point::new(0.0, 0.0)
        );
    }

    #[test]
    fn test_direct_scene_removal_pruned_before_dispatch() {
        let (mut editor, source, sink) = two_component_editor();
        editor.selection.select_single(Target::Component(source));

        // Host bypasses the editor and mutates the store directly.
        editor.scene.remove_component(source);

        // Ctrl-click toggles the sink in; the removed component must not
        // linger in the selection the handler sees.
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        editor.pointer_down(Point::new(350.0, 30.0), MouseButton::Left, ctrl);
        editor.pointer_up(Point::new(350.0, 30.0), ctrl);

        assert!(!editor.selection.is_selected(Target::Component(source)));
        assert_eq!(editor.selection.components(), vec![sink]);
    }

    #[test]
    fn test_connect_gesture_creates_line() {
        let (mut editor, source, sink) = two_component_editor();
        let from = output_center(&editor, source);
        let to = input_center(&editor, sink);

        drag(&mut editor, from, to);
        assert_eq!(editor.scene.line_count(), 1);
        let line = &editor.scene.lines()[0];
        assert_eq!(editor.scene.point_owner(line.start_point), Some(source));
        assert_eq!(editor.scene.point_owner(line.end_point), Some(sink));
        assert!(!editor.scene.resolve_point(line.start_point).unwrap().available);
        assert!(!editor.scene.resolve_point(line.end_point).unwrap().available);

        // History recorded before the line was added.
        assert_eq!(editor.undo().as_deref(), Some("Connect"));
        assert_eq!(editor.scene.line_count(), 0);
    }

    #[test]
    fn test_connect_api_rejects_bad_pairs() {
        let (mut editor, source, sink) = two_component_editor();
        let out = editor.scene.component(source).unwrap().outputs[0].id;
        let inp = editor.scene.component(sink).unwrap().inputs[0].id;

        // Input-to-input is invalid and records nothing.
        assert!(editor.connect(inp, inp).is_none());
        assert!(!editor.can_undo() || editor.undo_label() != Some("Connect"));

        assert!(editor.connect(out, inp).is_some());
        // The input is now wired; a second line is refused.
        assert!(editor.connect(out, inp).is_none());
    }

    #[test]
    fn test_remove_selected_detaches_lines() {
        let (mut editor, source, sink) = two_component_editor();
        let out = editor.scene.component(source).unwrap().outputs[0].id;
        let inp = editor.scene.component(sink).unwrap().inputs[0].id;
        editor.connect(out, inp).unwrap();

        editor.selection.select_single(Target::Component(source));
        editor.remove_selected();

        assert_eq!(editor.scene.component_count(), 1);
        assert_eq!(editor.scene.line_count(), 0);
        // The surviving endpoint is free again.
        assert!(editor.scene.resolve_point(inp).unwrap().available);

        editor.undo();
        assert_eq!(editor.scene.component_count(), 2);
        assert_eq!(editor.scene.line_count(), 1);
    }

    #[test]
    fn test_double_click_activates() {
        let (mut editor, source, _) = two_component_editor();
        let at = Point::new(50.0, 30.0);

        click(&mut editor, at);
        click(&mut editor, at);
        assert_eq!(editor.take_activated(), Some(EventTarget::Component(source)));
        assert_eq!(editor.take_activated(), None);
    }

    #[test]
    fn test_set_attribute_and_undo() {
        let (mut editor, source, _) = two_component_editor();
        let original = editor
            .scene
            .component(source)
            .unwrap()
            .attributes
            .get("label")
            .cloned();

        assert!(editor.set_attribute(source, "label", AttrValue::Text("Feed".into())));
        assert_eq!(
            editor.scene.component(source).unwrap().attributes.get("label"),
            Some(&AttrValue::Text("Feed".into()))
        );

        editor.undo();
        assert_eq!(
            editor.scene.component(source).unwrap().attributes.get("label"),
            original.as_ref()
        );
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (mut editor, source, sink) = two_component_editor();
        let out = editor.scene.component(source).unwrap().outputs[0].id;
        let inp = editor.scene.component(sink).unwrap().inputs[0].id;
        editor.connect(out, inp).unwrap();
        editor.selection.select_single(Target::Component(source));

        let json = editor.to_json().unwrap();
        let mut other = Editor::new();
        other.load_json(&json).unwrap();

        assert_eq!(other.scene.component_count(), 2);
        assert_eq!(other.scene.line_count(), 1);
        assert!(!other.can_undo());
        assert!(other.selection.is_empty());
    }

    #[test]
    fn test_camera_transforms_input() {
        let (mut editor, source, _) = two_component_editor();
        editor.camera.pan(kurbo::Vec2::new(100.0, 0.0));

        // Screen (150, 30) is canvas (50, 30): inside the source.
        click(&mut editor, Point::new(150.0, 30.0));
        assert!(editor.selection.is_selected(Target::Component(source)));
    }

    #[test]
    fn test_wheel_zooms_about_cursor() {
        let mut editor = Editor::new();
        let anchor = Point::new(200.0, 150.0);
        let before = editor.camera.screen_to_canvas(anchor);
        editor.wheel(anchor, 2.0);
        assert!(editor.camera.zoom > 1.0);
        let after = editor.camera.screen_to_canvas(anchor);
        assert!((before.x - after.x).abs() < 1e-10);
        assert!(editor.take_redraw());
    }

    #[test]
    fn test_shift_click_range_selects() {
        let mut editor = Editor::new();
        let a = editor.add_component("source", Point::new(0.0, 0.0)).unwrap();
        let b = editor.add_component("process", Point::new(0.0, 200.0)).unwrap();
        let c = editor.add_component("sink", Point::new(0.0, 400.0)).unwrap();

        click(&mut editor, Point::new(50.0, 30.0));
        editor.pointer_down(
            Point::new(50.0, 430.0),
            MouseButton::Left,
            Modifiers {
                shift: true,
                ..Modifiers::default()
            },
        );
        editor.pointer_up(
            Point::new(50.0, 430.0),
            Modifiers {
                shift: true,
                ..Modifiers::default()
            },
        );

        for id in [a, b, c] {
            assert!(editor.selection.is_selected(Target::Component(id)));
        }
    }
}
