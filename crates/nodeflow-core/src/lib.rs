//! NodeFlow Core Library
//!
//! Platform-agnostic engine for interactive node-and-wire diagram
//! editors: the component/line store, connection-point identity,
//! hit-testing and pointer gestures, selection, undo/redo history, and
//! scene serialization.

pub mod camera;
pub mod component;
pub mod document;
pub mod editor;
pub mod family;
pub mod geometry;
pub mod history;
pub mod interaction;
pub mod line;
pub mod registry;
pub mod scene;
pub mod selection;

pub use camera::Camera;
pub use component::{AttrValue, AttributeMap, Component, ComponentId, ConnectionPoint, Direction, PointId};
pub use document::{DocumentError, SceneDocument};
pub use editor::Editor;
pub use family::{Family, FamilyRegistry, stock_registry};
pub use history::{HistoryManager, MAX_HISTORY};
pub use interaction::{
    dispatch_event, hit_test, EventKind, EventTarget, Handled, HitTarget, InteractionEvent,
    InteractionHandler, InteractionPipeline, Modifiers, MouseButton,
};
pub use line::{ConnectionLine, LineColor, LineId, RoutingMode};
pub use registry::{PointLocation, PointRegistry};
pub use scene::Scene;
pub use selection::{SceneTarget, SelectionManager};
