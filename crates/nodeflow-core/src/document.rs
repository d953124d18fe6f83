//! Scene serialization protocol.
//!
//! Export walks the store into a transport-neutral document; import
//! rebuilds a live scene from it. The load order is the subsystem's key
//! invariant: every component is instantiated and has its persisted
//! connection-point identifiers re-assigned before any line is
//! reconstructed, so endpoint resolution never races the identity remap.

use crate::component::{AttributeMap, ComponentId, PointId};
use crate::family::FamilyRegistry;
use crate::line::{ConnectionLine, LineColor, RoutingMode};
use crate::scene::Scene;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Serialization errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One component in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRecord {
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Stable component id, kept so snapshot restores and round trips
    /// preserve identity. Documents from other producers may omit it.
    #[serde(default = "Uuid::new_v4")]
    pub id: ComponentId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub in_point_ids: Vec<PointId>,
    #[serde(default)]
    pub out_point_ids: Vec<PointId>,
}

/// One line in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRecord {
    pub start_point_id: PointId,
    pub end_point_id: PointId,
    #[serde(default)]
    pub routing_mode: RoutingMode,
    #[serde(default)]
    pub label1: Option<String>,
    #[serde(default)]
    pub label2: Option<String>,
    #[serde(default)]
    pub label3: Option<String>,
    #[serde(default)]
    pub show_start_arrow: bool,
    #[serde(default = "default_true")]
    pub show_end_arrow: bool,
    #[serde(default)]
    pub animated: bool,
    #[serde(default = "default_color_argb")]
    pub line_color_argb: u32,
}

fn default_true() -> bool {
    true
}

fn default_color_argb() -> u32 {
    LineColor::black().to_argb()
}

/// A complete serialized scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
    #[serde(default)]
    pub lines: Vec<LineRecord>,
}

impl SceneDocument {
    /// Export a live scene. Connection point identifiers are emitted in
    /// input-then-output order.
    pub fn export(scene: &Scene) -> Self {
        let components = scene
            .components()
            .map(|c| ComponentRecord {
                type_tag: c.type_tag.clone(),
                id: c.id,
                x: c.position.x,
                y: c.position.y,
                width: c.size.width,
                height: c.size.height,
                name: c.name.clone(),
                attributes: c.export_attributes(),
                enabled: c.enabled,
                visible: c.visible,
                locked: c.locked,
                in_point_ids: c.inputs.iter().map(|p| p.id).collect(),
                out_point_ids: c.outputs.iter().map(|p| p.id).collect(),
            })
            .collect();

        let lines = scene
            .lines()
            .iter()
            .map(|l| LineRecord {
                start_point_id: l.start_point,
                end_point_id: l.end_point,
                routing_mode: l.routing,
                label1: l.labels[0].clone(),
                label2: l.labels[1].clone(),
                label3: l.labels[2].clone(),
                show_start_arrow: l.show_start_arrow,
                show_end_arrow: l.show_end_arrow,
                animated: l.animated,
                line_color_argb: l.color.to_argb(),
            })
            .collect();

        Self { components, lines }
    }

    /// Rebuild a live scene from this document.
    ///
    /// The current scene is cleared wholesale. Components with unknown
    /// type tags and lines with unresolvable endpoints are skipped with
    /// a warning; a damaged document yields a partially-populated scene,
    /// never a failure.
    pub fn import_into(&self, scene: &mut Scene, families: &FamilyRegistry) {
        scene.clear();

        // Phase 1: instantiate every component and remap the persisted
        // point identifiers onto the fresh points, positionally.
        for record in &self.components {
            if scene.component(record.id).is_some() {
                log::warn!("skipping component record with duplicate id {}", record.id);
                continue;
            }
            let Some(mut component) = families.create(&record.type_tag) else {
                log::warn!("skipping component record with unknown type tag '{}'", record.type_tag);
                continue;
            };
            component.id = record.id;
            if !record.name.is_empty() {
                component.name = record.name.clone();
            }
            component.resize(Size::new(record.width, record.height));
            component.move_to(Point::new(record.x, record.y));
            component.enabled = record.enabled;
            component.visible = record.visible;
            component.locked = record.locked;
            component.import_attributes(&record.attributes);

            component.set_input_count(record.in_point_ids.len());
            component.set_output_count(record.out_point_ids.len());
            for (point, id) in component.inputs.iter_mut().zip(&record.in_point_ids) {
                point.id = *id;
            }
            for (point, id) in component.outputs.iter_mut().zip(&record.out_point_ids) {
                point.id = *id;
            }

            scene.add_component(component);
        }

        // Phase 2: reconstruct lines through the registry; the remap
        // above is complete, so any remaining miss is a genuinely
        // dangling endpoint.
        for record in &self.lines {
            let mut line = ConnectionLine::new(record.start_point_id, record.end_point_id);
            line.routing = record.routing_mode;
            line.labels = [
                record.label1.clone(),
                record.label2.clone(),
                record.label3.clone(),
            ];
            line.show_start_arrow = record.show_start_arrow;
            line.show_end_arrow = record.show_end_arrow;
            line.animated = record.animated;
            line.color = LineColor::from_argb(record.line_color_argb);
            // add_line logs and skips any line that fails to resolve.
            scene.add_line(line);
        }
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::AttrValue;
    use crate::family::stock_registry;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn pipeline_scene(families: &FamilyRegistry) -> Scene {
        let mut scene = Scene::new();

        let mut source = families.create("source").unwrap();
        source.move_to(Point::new(50.0, 50.0));
        let start = source.outputs[0].id;
        let source_id = scene.add_component(source);

        let mut sink = families.create("sink").unwrap();
        sink.move_to(Point::new(400.0, 80.0));
        sink.attributes
            .insert("label".to_string(), AttrValue::Text("Out".to_string()));
        let end = sink.inputs[0].id;
        scene.add_component(sink);

        let mut line = ConnectionLine::new(start, end);
        line.routing = RoutingMode::Orthogonal;
        line.set_label(1, "flow");
        scene.add_line(line).unwrap();

        scene.bring_to_front(source_id);
        scene
    }

    #[test]
    fn test_roundtrip_counts_and_linkage() {
        let families = stock_registry();
        let scene = pipeline_scene(&families);
        let doc = SceneDocument::export(&scene);

        let mut restored = Scene::new();
        doc.import_into(&mut restored, &families);

        assert_eq!(restored.component_count(), scene.component_count());
        assert_eq!(restored.line_count(), scene.line_count());

        // Every line endpoint resolves to a point on the same relative
        // component as before export.
        for (orig, new) in scene.lines().iter().zip(restored.lines()) {
            assert_eq!(orig.start_point, new.start_point);
            let orig_owner = scene.point_owner(orig.start_point).unwrap();
            let new_owner = restored.point_owner(new.start_point).unwrap();
            assert_eq!(orig_owner, new_owner);
        }

        // Wired points come back unavailable.
        let line = &restored.lines()[0];
        assert!(!restored.resolve_point(line.start_point).unwrap().available);
    }

    #[test]
    fn test_roundtrip_preserves_geometry_and_attributes() {
        let families = stock_registry();
        let scene = pipeline_scene(&families);
        let json = SceneDocument::export(&scene).to_json().unwrap();

        let mut restored = Scene::new();
        SceneDocument::from_json(&json)
            .unwrap()
            .import_into(&mut restored, &families);

        for original in scene.components() {
            let component = restored.component(original.id).unwrap();
            assert_eq!(component.position, original.position);
            assert_eq!(component.size, original.size);
            assert_eq!(component.attributes, original.attributes);
        }
        assert_eq!(restored.lines()[0].routing, RoutingMode::Orthogonal);
        assert_eq!(restored.lines()[0].labels[1].as_deref(), Some("flow"));
    }

    #[test]
    fn test_roundtrip_preserves_z_order() {
        let families = stock_registry();
        let scene = pipeline_scene(&families);
        let doc = SceneDocument::export(&scene);

        let mut restored = Scene::new();
        doc.import_into(&mut restored, &families);
        assert_eq!(restored.z_order(), scene.z_order());
    }

    #[test]
    fn test_unknown_type_tag_skipped() {
        init_logs();
        let families = stock_registry();
        let scene = pipeline_scene(&families);
        let mut doc = SceneDocument::export(&scene);
        doc.components[0].type_tag = "from_the_future".to_string();

        let mut restored = Scene::new();
        doc.import_into(&mut restored, &families);

        // The component is dropped; the line dangles and is skipped too.
        assert_eq!(restored.component_count(), 1);
        assert_eq!(restored.line_count(), 0);
    }

    #[test]
    fn test_duplicate_component_id_skipped() {
        init_logs();
        let families = stock_registry();
        let scene = pipeline_scene(&families);
        let mut doc = SceneDocument::export(&scene);
        doc.components.push(doc.components[0].clone());

        let mut restored = Scene::new();
        doc.import_into(&mut restored, &families);

        // One live entry per id; the z-order holds no ghosts.
        assert_eq!(restored.component_count(), 2);
        assert_eq!(restored.z_order().len(), 2);
        assert_eq!(restored.components().count(), 2);
        assert_eq!(restored.line_count(), 1);
    }

    #[test]
    fn test_dangling_line_skipped() {
        init_logs();
        let families = stock_registry();
        let scene = pipeline_scene(&families);
        let mut doc = SceneDocument::export(&scene);
        doc.lines[0].end_point_id = Uuid::new_v4();

        let mut restored = Scene::new();
        doc.import_into(&mut restored, &families);
        assert_eq!(restored.component_count(), 2);
        assert_eq!(restored.line_count(), 0);
    }

    #[test]
    fn test_import_clears_existing_scene() {
        let families = stock_registry();
        let mut scene = pipeline_scene(&families);
        let doc = SceneDocument::default();
        doc.import_into(&mut scene, &families);
        assert!(scene.is_empty());
        assert!(scene.registry().is_empty());
    }

    #[test]
    fn test_unknown_json_keys_ignored() {
        let json = r#"{
            "components": [],
            "lines": [],
            "editorVersion": "9.9",
            "futureField": {"nested": true}
        }"#;
        let doc = SceneDocument::from_json(json).unwrap();
        assert!(doc.components.is_empty());
    }

    #[test]
    fn test_missing_optional_line_fields_default() {
        let families = stock_registry();
        let scene = pipeline_scene(&families);
        let start = scene.lines()[0].start_point;
        let end = scene.lines()[0].end_point;
        let mut doc = SceneDocument::export(&scene);
        doc.lines = vec![];

        let json = format!(
            r#"{{
                "components": {},
                "lines": [{{"start_point_id": "{}", "end_point_id": "{}"}}]
            }}"#,
            serde_json::to_string(&doc.components).unwrap(),
            start,
            end
        );
        let parsed = SceneDocument::from_json(&json).unwrap();
        let mut restored = Scene::new();
        parsed.import_into(&mut restored, &families);

        assert_eq!(restored.line_count(), 1);
        let line = &restored.lines()[0];
        assert_eq!(line.routing, RoutingMode::Straight);
        assert!(line.show_end_arrow);
        assert!(!line.show_start_arrow);
    }
}
