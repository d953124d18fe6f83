//! Components and their connection points.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier for components.
pub type ComponentId = Uuid;

/// Unique identifier for connection points.
///
/// Assigned at creation and preserved across serialization round-trips;
/// never changes afterwards.
pub type PointId = Uuid;

/// Hit radius for connection points, in world units.
pub const POINT_HIT_RADIUS: f64 = 8.0;

/// Direction of a connection point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

/// A directional attachment spot on a component where a line may terminate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionPoint {
    pub id: PointId,
    pub direction: Direction,
    /// Index within the owning input or output list.
    pub index: usize,
    /// Center in world coordinates, derived from the owner's geometry.
    pub center: Point,
    /// False once a line is wired to this point.
    pub available: bool,
}

impl ConnectionPoint {
    pub fn new(direction: Direction, index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            direction,
            index,
            center: Point::ZERO,
            available: true,
        }
    }

    /// Bounding box used for hit-testing.
    pub fn bounds(&self) -> Rect {
        Rect::from_center_size(self.center, Size::new(POINT_HIT_RADIUS * 2.0, POINT_HIT_RADIUS * 2.0))
    }

    /// Check if a point (in world coordinates) hits this connection point.
    pub fn hit_test(&self, point: Point) -> bool {
        let dx = point.x - self.center.x;
        let dy = point.y - self.center.y;
        dx * dx + dy * dy <= POINT_HIT_RADIUS * POINT_HIT_RADIUS
    }
}

/// A typed attribute value, enumerable by a generic property editor
/// without runtime type introspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// An enum-like value with its set of permitted choices.
    Choice {
        selected: String,
        options: Vec<String>,
    },
    /// Packed ARGB color.
    Color(u32),
}

impl AttrValue {
    /// Get the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the numeric content, if this is a number value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// String-keyed attribute map for family-specific metadata.
pub type AttributeMap = BTreeMap<String, AttrValue>;

/// A positioned, sized, named visual entity with input and output
/// connection points.
///
/// The point lists are only resized through [`Component::set_input_count`]
/// and [`Component::set_output_count`] (family logic); point identity and
/// registry membership are owned by the scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    /// Family type tag used to re-instantiate the component on load.
    pub type_tag: String,
    pub name: String,
    /// Top-left corner in world coordinates.
    pub position: Point,
    pub size: Size,
    pub enabled: bool,
    pub visible: bool,
    /// Locked components cannot be dragged; they can still be clicked.
    pub locked: bool,
    pub inputs: Vec<ConnectionPoint>,
    pub outputs: Vec<ConnectionPoint>,
    pub attributes: AttributeMap,
}

impl Component {
    /// Create a new component with the given point counts.
    pub fn new(
        type_tag: impl Into<String>,
        name: impl Into<String>,
        position: Point,
        size: Size,
        input_count: usize,
        output_count: usize,
    ) -> Self {
        let mut component = Self {
            id: Uuid::new_v4(),
            type_tag: type_tag.into(),
            name: name.into(),
            position,
            size,
            enabled: true,
            visible: true,
            locked: false,
            inputs: (0..input_count)
                .map(|i| ConnectionPoint::new(Direction::Input, i))
                .collect(),
            outputs: (0..output_count)
                .map(|i| ConnectionPoint::new(Direction::Output, i))
                .collect(),
            attributes: AttributeMap::new(),
        };
        component.layout_points();
        component
    }

    /// Get the bounding box in world coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Check if a point (in world coordinates) is inside the component.
    pub fn hit_test(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }

    /// Move the component so its top-left corner is at `position` and
    /// refresh connection point centers.
    pub fn move_to(&mut self, position: Point) {
        self.position = position;
        self.layout_points();
    }

    /// Resize the component and refresh connection point centers.
    pub fn resize(&mut self, size: Size) {
        self.size = size;
        self.layout_points();
    }

    /// Set the number of input points, preserving existing points and
    /// their identifiers where possible.
    pub fn set_input_count(&mut self, count: usize) {
        resize_points(&mut self.inputs, Direction::Input, count);
        self.layout_points();
    }

    /// Set the number of output points, preserving existing points and
    /// their identifiers where possible.
    pub fn set_output_count(&mut self, count: usize) {
        resize_points(&mut self.outputs, Direction::Output, count);
        self.layout_points();
    }

    /// Recompute connection point centers from the component geometry.
    /// Inputs are spaced along the left edge, outputs along the right.
    pub fn layout_points(&mut self) {
        let bounds = self.bounds();
        space_along_edge(&mut self.inputs, bounds.x0, bounds.y0, bounds.height());
        space_along_edge(&mut self.outputs, bounds.x1, bounds.y0, bounds.height());
    }

    /// Iterate all connection points, inputs first.
    pub fn points(&self) -> impl Iterator<Item = &ConnectionPoint> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Iterate all connection points mutably, inputs first.
    pub fn points_mut(&mut self) -> impl Iterator<Item = &mut ConnectionPoint> {
        self.inputs.iter_mut().chain(self.outputs.iter_mut())
    }

    /// Look up a connection point by identifier.
    pub fn point(&self, id: PointId) -> Option<&ConnectionPoint> {
        self.points().find(|p| p.id == id)
    }

    /// Look up a connection point mutably by identifier.
    pub fn point_mut(&mut self, id: PointId) -> Option<&mut ConnectionPoint> {
        self.points_mut().find(|p| p.id == id)
    }

    /// Find the connection point (if any) at a world position.
    pub fn point_at(&self, position: Point) -> Option<&ConnectionPoint> {
        self.points().find(|p| p.hit_test(position))
    }

    /// Snapshot of the attribute map for serialization; the serializer
    /// never inspects the concrete family.
    pub fn export_attributes(&self) -> AttributeMap {
        self.attributes.clone()
    }

    /// Merge persisted attributes over the family defaults. Keys the
    /// family does not know are kept opaquely.
    pub fn import_attributes(&mut self, attributes: &AttributeMap) {
        for (key, value) in attributes {
            self.attributes.insert(key.clone(), value.clone());
        }
    }
}

/// Resize a point list in place, keeping surviving points untouched.
fn resize_points(points: &mut Vec<ConnectionPoint>, direction: Direction, count: usize) {
    while points.len() > count {
        points.pop();
    }
    while points.len() < count {
        let index = points.len();
        points.push(ConnectionPoint::new(direction, index));
    }
}

/// Space points evenly along a vertical edge.
fn space_along_edge(points: &mut [ConnectionPoint], x: f64, y0: f64, height: f64) {
    let count = points.len();
    for (i, point) in points.iter_mut().enumerate() {
        let t = (i as f64 + 1.0) / (count as f64 + 1.0);
        point.index = i;
        point.center = Point::new(x, y0 + height * t);
    }
}
