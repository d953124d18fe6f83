//! Connection lines between component connection points.

use crate::component::PointId;
use crate::geometry::{arrow_head, point_in_triangle, point_to_polyline_dist};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for lines.
pub type LineId = Uuid;

/// Size of the arrow head, in world units.
pub const ARROW_HEAD_SIZE: f64 = 12.0;

/// Path-shape policy used to draw a line between two resolved points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    #[default]
    Straight,
    Orthogonal,
    Curved,
}

/// RGBA8 line color, serialized as packed ARGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl LineColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Pack as 0xAARRGGBB.
    pub fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Unpack from 0xAARRGGBB.
    pub fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }
}

impl Default for LineColor {
    fn default() -> Self {
        Self::black()
    }
}

/// A routable line between two connection points.
///
/// Endpoints are referenced by point identity rather than by object, so
/// lines survive component replacement during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionLine {
    pub id: LineId,
    pub start_point: PointId,
    pub end_point: PointId,
    #[serde(default)]
    pub routing: RoutingMode,
    /// Up to three display labels (start, middle, end).
    #[serde(default)]
    pub labels: [Option<String>; 3],
    #[serde(default)]
    pub show_start_arrow: bool,
    #[serde(default = "default_true")]
    pub show_end_arrow: bool,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub color: LineColor,
    /// Transient highlight flag, not persisted.
    #[serde(skip)]
    pub selected: bool,
}

fn default_true() -> bool {
    true
}

impl ConnectionLine {
    /// Create a new line between two connection points.
    pub fn new(start_point: PointId, end_point: PointId) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_point,
            end_point,
            routing: RoutingMode::default(),
            labels: [None, None, None],
            show_start_arrow: false,
            show_end_arrow: true,
            animated: false,
            color: LineColor::default(),
            selected: false,
        }
    }

    /// Set one of the three display labels (0 = start, 1 = middle, 2 = end).
    pub fn set_label(&mut self, slot: usize, label: impl Into<String>) {
        if let Some(entry) = self.labels.get_mut(slot) {
            *entry = Some(label.into());
        }
    }

    /// Compute the route polyline for the given resolved endpoint centers.
    pub fn route_points(&self, start: Point, end: Point) -> Vec<Point> {
        match self.routing {
            RoutingMode::Straight => vec![start, end],
            RoutingMode::Orthogonal => {
                let mid_x = (start.x + end.x) / 2.0;
                vec![
                    start,
                    Point::new(mid_x, start.y),
                    Point::new(mid_x, end.y),
                    end,
                ]
            }
            RoutingMode::Curved => sample_curve(start, end),
        }
    }

    /// Check if a point hits the line body.
    pub fn hit_test_body(&self, point: Point, start: Point, end: Point, tolerance: f64) -> bool {
        let route = self.route_points(start, end);
        point_to_polyline_dist(point, &route) <= tolerance
    }

    /// Check if a point hits one of the visible arrow-head regions.
    pub fn hit_test_arrow(&self, point: Point, start: Point, end: Point) -> bool {
        let route = self.route_points(start, end);
        if route.len() < 2 {
            return false;
        }

        if self.show_end_arrow {
            let tip = route[route.len() - 1];
            let prev = route[route.len() - 2];
            let [a, b, c] = arrow_head(tip, Vec2::new(tip.x - prev.x, tip.y - prev.y), ARROW_HEAD_SIZE);
            if point_in_triangle(point, a, b, c) {
                return true;
            }
        }

        if self.show_start_arrow {
            let tip = route[0];
            let next = route[1];
            let [a, b, c] = arrow_head(tip, Vec2::new(tip.x - next.x, tip.y - next.y), ARROW_HEAD_SIZE);
            if point_in_triangle(point, a, b, c) {
                return true;
            }
        }

        false
    }
}

/// Approximate the curved route with a flattened cubic so hit-testing
/// and rendering share the same polyline.
fn sample_curve(start: Point, end: Point) -> Vec<Point> {
    const SAMPLES: usize = 16;
    let dx = (end.x - start.x).abs().max(40.0) / 2.0;
    let c1 = Point::new(start.x + dx, start.y);
    let c2 = Point::new(end.x - dx, end.y);

    (0..=SAMPLES)
        .map(|i| {
            let t = i as f64 / SAMPLES as f64;
            let mt = 1.0 - t;
            let w0 = mt * mt * mt;
            let w1 = 3.0 * mt * mt * t;
            let w2 = 3.0 * mt * t * t;
            let w3 = t * t * t;
            Point::new(
                w0 * start.x + w1 * c1.x + w2 * c2.x + w3 * end.x,
                w0 * start.y + w1 * c1.y + w2 * c2.y + w3 * end.y,
            )
        })
        .collect()
}
