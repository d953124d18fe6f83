//! Interaction pipeline: pointer gestures, hit-testing, and typed
//! interaction events.
//!
//! One state machine per pointer device: `Idle → Pressed →
//! (Dragging | Clicked)`. Exactly one of the component, line, or canvas
//! categories fires per gesture, and hit-testing precedence (line arrow
//! head > line body > component > canvas) is a first-class contract.

use crate::component::{ComponentId, Direction, PointId};
use crate::line::LineId;
use crate::scene::Scene;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;

/// Double-click window: time threshold from the prior click.
pub const DOUBLE_CLICK_TIME_MS: u128 = 500;
/// Double-click window: spatial threshold from the prior click.
pub const DOUBLE_CLICK_DISTANCE: f64 = 5.0;
/// Movement beyond this tolerance turns a press into a drag.
pub const DRAG_TOLERANCE: f64 = 3.0;
/// Distance within which a line body counts as hit.
pub const LINE_HIT_TOLERANCE: f64 = 6.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Raw hit-test result, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// An arrow-head region of a line.
    LineArrow(LineId),
    /// The body of a line.
    LineBody(LineId),
    /// A connection point on a component.
    Point {
        component: ComponentId,
        point: PointId,
    },
    /// A component's bounds.
    Component(ComponentId),
    /// Empty canvas.
    Canvas,
}

/// The interaction category an event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Component(ComponentId),
    Line(LineId),
    Canvas,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Click(MouseButton),
    DoubleClick,
    HoverEnter,
    HoverLeave,
    /// A move drag passed the tolerance. The crossing frame's delta is
    /// applied in the same call; consumers that need pre-drag state
    /// capture it at press time (see
    /// [`InteractionPipeline::press_may_move`]).
    DragStarted,
    DragEnded,
    /// A connection drag was released over a valid input point; both
    /// endpoints resolved at the time of the event.
    ConnectRequested { start: PointId, end: PointId },
    /// A connection drag was released over nothing usable.
    ConnectCancelled,
}

/// A typed interaction event raised by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    pub target: EventTarget,
    pub kind: EventKind,
    pub position: Point,
    pub modifiers: Modifiers,
}

/// Consumed/unconsumed result of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Yes,
    No,
}

impl Handled {
    pub fn is_handled(self) -> bool {
        self == Handled::Yes
    }
}

/// A prioritized consumer of interaction events.
pub trait InteractionHandler {
    fn on_event(&mut self, scene: &mut Scene, event: &InteractionEvent) -> Handled;
}

/// Dispatch an event through handlers in priority order, stopping at the
/// first one that consumes it. Once a handler claims the event, no
/// lower-priority handler sees the same gesture.
pub fn dispatch_event(
    scene: &mut Scene,
    event: &InteractionEvent,
    handlers: &mut [&mut dyn InteractionHandler],
) -> Handled {
    for handler in handlers.iter_mut() {
        if handler.on_event(scene, event).is_handled() {
            return Handled::Yes;
        }
    }
    Handled::No
}

/// Hit-test a world position against the scene, in precedence order:
/// line arrow heads, then line bodies, then components (topmost first,
/// connection points before the body), then empty canvas.
pub fn hit_test(scene: &Scene, position: Point) -> HitTarget {
    for line in scene.lines().iter().rev() {
        if let Some(route) = scene.line_route(line) {
            if line.hit_test_arrow(position, route[0], route[route.len() - 1]) {
                return HitTarget::LineArrow(line.id);
            }
        }
    }

    for line in scene.lines().iter().rev() {
        if let (Some(start), Some(end)) = (
            scene.resolve_point(line.start_point),
            scene.resolve_point(line.end_point),
        ) {
            if line.hit_test_body(position, start.center, end.center, LINE_HIT_TOLERANCE) {
                return HitTarget::LineBody(line.id);
            }
        }
    }

    for id in scene.z_order().iter().rev() {
        let Some(component) = scene.component(*id) else {
            continue;
        };
        if !component.visible {
            continue;
        }
        if let Some(point) = component.point_at(position) {
            return HitTarget::Point {
                component: component.id,
                point: point.id,
            };
        }
        if component.hit_test(position) {
            return HitTarget::Component(component.id);
        }
    }

    HitTarget::Canvas
}

/// Map a raw hit to its interaction category. Connection points belong
/// to the component category.
fn event_target(hit: HitTarget) -> EventTarget {
    match hit {
        HitTarget::LineArrow(id) | HitTarget::LineBody(id) => EventTarget::Line(id),
        HitTarget::Point { component, .. } | HitTarget::Component(component) => {
            EventTarget::Component(component)
        }
        HitTarget::Canvas => EventTarget::Canvas,
    }
}

/// Move every dragged component to its original position plus the
/// pointer delta from drag-start. Clamping happens in the scene.
fn apply_move(
    scene: &mut Scene,
    start: Point,
    originals: &[(ComponentId, Point)],
    position: Point,
) {
    let dx = position.x - start.x;
    let dy = position.y - start.y;
    for (id, orig) in originals {
        scene.move_component(*id, Point::new(orig.x + dx, orig.y + dy));
    }
}

/// Hover targets are components and lines; the canvas is not hovered.
fn hover_target(hit: HitTarget) -> Option<EventTarget> {
    match event_target(hit) {
        EventTarget::Canvas => None,
        target => Some(target),
    }
}

#[derive(Debug, Clone)]
enum PointerState {
    Idle,
    Pressed {
        start: Point,
        modifiers: Modifiers,
        target: HitTarget,
        /// This press is the second half of a double-click window.
        is_double: bool,
        /// The pointer left the click tolerance without a drag starting.
        moved: bool,
        /// Components this gesture would move, empty if none.
        drag_set: Vec<ComponentId>,
        /// Output point this gesture would wire from, if any.
        connect_from: Option<PointId>,
    },
    DraggingMove {
        start: Point,
        originals: Vec<(ComponentId, Point)>,
    },
    DraggingConnect {
        from: PointId,
        current: Point,
    },
}

/// Translates pointer callbacks into interaction events and drag
/// mutations. Positions are in canvas coordinates; the host adapter
/// performs the platform-to-canvas transform.
#[derive(Debug)]
pub struct InteractionPipeline {
    state: PointerState,
    hovered: Option<EventTarget>,
    last_click: Option<(Instant, Point)>,
    events: VecDeque<InteractionEvent>,
}

impl Default for InteractionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionPipeline {
    pub fn new() -> Self {
        Self {
            state: PointerState::Idle,
            hovered: None,
            last_click: None,
            events: VecDeque::new(),
        }
    }

    /// Events raised since the last drain, in order.
    pub fn drain_events(&mut self) -> Vec<InteractionEvent> {
        self.events.drain(..).collect()
    }

    /// The currently hovered target, if any.
    pub fn hovered(&self) -> Option<EventTarget> {
        self.hovered
    }

    /// An in-flight connection drag as (source point, cursor position),
    /// for preview rendering.
    pub fn connect_preview(&self) -> Option<(PointId, Point)> {
        match &self.state {
            PointerState::DraggingConnect { from, current } => Some((*from, *current)),
            _ => None,
        }
    }

    /// True while a press could still become a component move drag.
    /// Hosts that snapshot state for undo capture it here, at press
    /// time, before any drag delta lands.
    pub fn press_may_move(&self) -> bool {
        matches!(&self.state, PointerState::Pressed { drag_set, .. } if !drag_set.is_empty())
    }

    pub fn is_dragging(&self) -> bool {
        matches!(
            self.state,
            PointerState::DraggingMove { .. } | PointerState::DraggingConnect { .. }
        )
    }

    /// Begin a gesture. `selected` is the current component selection,
    /// used to decide whether a drag moves one component or the whole
    /// selection.
    pub fn pointer_down(
        &mut self,
        scene: &Scene,
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
        selected: &[ComponentId],
    ) {
        if !matches!(self.state, PointerState::Idle) {
            return;
        }

        let target = hit_test(scene, position);

        // Right and middle clicks bypass the double-click timer and
        // fire immediately; they never start a drag.
        if button != MouseButton::Left {
            self.events.push_back(InteractionEvent {
                target: event_target(target),
                kind: EventKind::Click(button),
                position,
                modifiers,
            });
            return;
        }

        let is_double = match self.last_click {
            Some((at, pos)) => {
                at.elapsed().as_millis() <= DOUBLE_CLICK_TIME_MS
                    && pos.distance(position) <= DOUBLE_CLICK_DISTANCE
            }
            None => false,
        };

        let connect_from = match target {
            HitTarget::Point { component, point } => {
                let connectable = scene.resolve_point(point).is_some_and(|p| {
                    p.direction == Direction::Output && p.available
                }) && scene.component(component).is_some_and(|c| c.enabled);
                connectable.then_some(point)
            }
            _ => None,
        };

        let drag_component = match target {
            HitTarget::Component(id) => Some(id),
            HitTarget::Point { component, .. } if connect_from.is_none() => Some(component),
            _ => None,
        };
        let drag_set = match drag_component {
            Some(id) if scene.component(id).is_some_and(|c| !c.locked) => {
                if selected.contains(&id) {
                    selected
                        .iter()
                        .copied()
                        .filter(|cid| scene.component(*cid).is_some_and(|c| !c.locked))
                        .collect()
                } else {
                    vec![id]
                }
            }
            _ => Vec::new(),
        };

        self.state = PointerState::Pressed {
            start: position,
            modifiers,
            target,
            is_double,
            moved: false,
            drag_set,
            connect_from,
        };
    }

    /// Track movement: updates hover when idle, promotes a press to a
    /// drag past the tolerance, and applies drag deltas.
    pub fn pointer_move(&mut self, scene: &mut Scene, position: Point, modifiers: Modifiers) {
        match &mut self.state {
            PointerState::Idle => {
                self.update_hover(scene, position, modifiers);
            }
            PointerState::Pressed {
                start,
                target,
                moved,
                drag_set,
                connect_from,
                ..
            } => {
                if start.distance(position) <= DRAG_TOLERANCE {
                    return;
                }
                if let Some(from) = *connect_from {
                    self.state = PointerState::DraggingConnect {
                        from,
                        current: position,
                    };
                    scene.request_redraw();
                } else if !drag_set.is_empty() {
                    let start = *start;
                    let originals: Vec<(ComponentId, Point)> = drag_set
                        .iter()
                        .filter_map(|id| scene.component(*id).map(|c| (c.id, c.position)))
                        .collect();
                    let primary = event_target(*target);
                    self.state = PointerState::DraggingMove {
                        start,
                        originals: originals.clone(),
                    };
                    self.events.push_back(InteractionEvent {
                        target: primary,
                        kind: EventKind::DragStarted,
                        position,
                        modifiers,
                    });
                    // The crossing frame's delta counts too; a minimal
                    // down-move-up gesture must already have moved.
                    apply_move(scene, start, &originals, position);
                } else {
                    *moved = true;
                }
            }
            PointerState::DraggingMove { start, originals } => {
                apply_move(scene, *start, originals, position);
            }
            PointerState::DraggingConnect { current, .. } => {
                *current = position;
                scene.request_redraw();
            }
        }
    }

    /// End a gesture: resolves click vs. double-click vs. drag end, and
    /// validates connection drops. A move drag applies its final delta
    /// at the release position.
    pub fn pointer_up(&mut self, scene: &mut Scene, position: Point, modifiers: Modifiers) {
        let state = std::mem::replace(&mut self.state, PointerState::Idle);
        match state {
            PointerState::Idle => {}
            PointerState::Pressed {
                target,
                is_double,
                moved,
                ..
            } => {
                if moved {
                    // Movement past tolerance without a drag; not a click.
                    return;
                }
                if is_double {
                    self.last_click = None;
                    self.events.push_back(InteractionEvent {
                        target: event_target(target),
                        kind: EventKind::DoubleClick,
                        position,
                        modifiers,
                    });
                } else {
                    self.last_click = Some((Instant::now(), position));
                    self.events.push_back(InteractionEvent {
                        target: event_target(target),
                        kind: EventKind::Click(MouseButton::Left),
                        position,
                        modifiers,
                    });
                }
            }
            PointerState::DraggingMove { start, originals } => {
                apply_move(scene, start, &originals, position);
                let target = originals
                    .first()
                    .map(|(id, _)| EventTarget::Component(*id))
                    .unwrap_or(EventTarget::Canvas);
                self.events.push_back(InteractionEvent {
                    target,
                    kind: EventKind::DragEnded,
                    position,
                    modifiers,
                });
            }
            PointerState::DraggingConnect { from, .. } => {
                self.finish_connect(scene, from, position, modifiers);
            }
        }
    }

    /// Validate a connection drop. On any failure the drag is silently
    /// cancelled; the only user-visible effect is the visual snap-back.
    fn finish_connect(&mut self, scene: &Scene, from: PointId, position: Point, modifiers: Modifiers) {
        let cancelled = |events: &mut VecDeque<InteractionEvent>, reason: &str| {
            log::debug!("connection drag cancelled: {reason}");
            events.push_back(InteractionEvent {
                target: EventTarget::Canvas,
                kind: EventKind::ConnectCancelled,
                position,
                modifiers,
            });
        };

        let Some(source_owner) = scene.point_owner(from) else {
            return cancelled(&mut self.events, "source point no longer resolves");
        };
        if scene.resolve_point(from).is_none_or(|p| !p.available) {
            return cancelled(&mut self.events, "source point no longer available");
        }

        let HitTarget::Point { component, point } = hit_test(scene, position) else {
            return cancelled(&mut self.events, "released outside a connection point");
        };
        let Some(target_point) = scene.resolve_point(point) else {
            return cancelled(&mut self.events, "target point does not resolve");
        };
        if target_point.direction != Direction::Input {
            return cancelled(&mut self.events, "target point is not an input");
        }
        if !target_point.available {
            return cancelled(&mut self.events, "target point already wired");
        }
        if component == source_owner {
            return cancelled(&mut self.events, "cannot wire a component to itself");
        }

        self.events.push_back(InteractionEvent {
            target: EventTarget::Component(component),
            kind: EventKind::ConnectRequested { start: from, end: point },
            position,
            modifiers,
        });
    }

    /// Update the hovered target. Leaving the previous target is always
    /// raised before entering the new one, so highlight-toggling
    /// consumers never see two simultaneous targets.
    fn update_hover(&mut self, scene: &Scene, position: Point, modifiers: Modifiers) {
        let new_target = hover_target(hit_test(scene, position));
        if new_target == self.hovered {
            return;
        }

        if let Some(old) = self.hovered {
            self.events.push_back(InteractionEvent {
                target: old,
                kind: EventKind::HoverLeave,
                position,
                modifiers,
            });
        }
        if let Some(new) = new_target {
            self.events.push_back(InteractionEvent {
                target: new,
                kind: EventKind::HoverEnter,
                position,
                modifiers,
            });
        }
        self.hovered = new_target;
    }
}
