//! Component families: type tags mapped to component templates.
//!
//! The engine never inspects concrete node subtypes; a family supplies
//! the bounding geometry, connection point counts, and default attribute
//! map for its tag. Domain catalogues (flowchart, ETL, UML, ...)
//! register their own families on top of the stock set.

use crate::component::{AttrValue, Component};
use kurbo::{Point, Size};
use std::collections::HashMap;

/// A component family: a factory for one type tag.
pub trait Family: Send + Sync {
    /// Type tag emitted into serialized documents.
    fn type_tag(&self) -> &str;

    /// Human-readable name for palettes and new components.
    fn display_name(&self) -> &str {
        self.type_tag()
    }

    /// Create a fresh component template at the origin.
    fn create(&self) -> Component;
}

/// Registry of families keyed by type tag.
pub struct FamilyRegistry {
    families: HashMap<String, Box<dyn Family>>,
}

impl FamilyRegistry {
    pub fn new() -> Self {
        Self {
            families: HashMap::new(),
        }
    }

    /// Register a family. A family registered under an existing tag
    /// replaces the previous one.
    pub fn register(&mut self, family: Box<dyn Family>) {
        self.families.insert(family.type_tag().to_string(), family);
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.families.contains_key(type_tag)
    }

    /// Instantiate a component for a type tag. Unknown tags return
    /// `None`; loaders skip the record rather than failing.
    pub fn create(&self, type_tag: &str) -> Option<Component> {
        self.families.get(type_tag).map(|f| f.create())
    }

    /// Registered type tags, unordered.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(|k| k.as_str())
    }
}

impl Default for FamilyRegistry {
    fn default() -> Self {
        stock_registry()
    }
}

impl std::fmt::Debug for FamilyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&str> = self.tags().collect();
        tags.sort_unstable();
        f.debug_struct("FamilyRegistry").field("tags", &tags).finish()
    }
}

/// A generic family described by data rather than a bespoke type.
struct BasicFamily {
    tag: &'static str,
    name: &'static str,
    size: Size,
    inputs: usize,
    outputs: usize,
    attributes: Vec<(&'static str, AttrValue)>,
}

impl Family for BasicFamily {
    fn type_tag(&self) -> &str {
        self.tag
    }

    fn display_name(&self) -> &str {
        self.name
    }

    fn create(&self) -> Component {
        let mut component = Component::new(
            self.tag,
            self.name,
            Point::ZERO,
            self.size,
            self.inputs,
            self.outputs,
        );
        for (key, value) in &self.attributes {
            component.attributes.insert((*key).to_string(), value.clone());
        }
        component
    }
}

/// The stock catalogue: enough generic node kinds to build pipelines
/// and flowcharts without an external palette.
pub fn stock_registry() -> FamilyRegistry {
    let mut registry = FamilyRegistry::new();
    registry.register(Box::new(BasicFamily {
        tag: "source",
        name: "Source",
        size: Size::new(120.0, 60.0),
        inputs: 0,
        outputs: 1,
        attributes: vec![("label", AttrValue::Text("Source".to_string()))],
    }));
    registry.register(Box::new(BasicFamily {
        tag: "process",
        name: "Process",
        size: Size::new(140.0, 70.0),
        inputs: 1,
        outputs: 1,
        attributes: vec![("label", AttrValue::Text("Process".to_string()))],
    }));
    registry.register(Box::new(BasicFamily {
        tag: "decision",
        name: "Decision",
        size: Size::new(120.0, 90.0),
        inputs: 1,
        outputs: 2,
        attributes: vec![
            ("label", AttrValue::Text("Decision".to_string())),
            (
                "mode",
                AttrValue::Choice {
                    selected: "first_match".to_string(),
                    options: vec!["first_match".to_string(), "all_matches".to_string()],
                },
            ),
        ],
    }));
    registry.register(Box::new(BasicFamily {
        tag: "sink",
        name: "Sink",
        size: Size::new(120.0, 60.0),
        inputs: 1,
        outputs: 0,
        attributes: vec![("label", AttrValue::Text("Sink".to_string()))],
    }));
    registry.register(Box::new(BasicFamily {
        tag: "note",
        name: "Note",
        size: Size::new(160.0, 100.0),
        inputs: 0,
        outputs: 0,
        attributes: vec![
            ("text", AttrValue::Text(String::new())),
            ("color", AttrValue::Color(0xFFFFF3B0)),
        ],
    }));
    registry
}
