//! Pan/zoom view transform for the scene.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Camera managing the view transform between screen and canvas
/// coordinates. The host input adapter uses it to translate platform
/// events before they reach the interaction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan), in screen units.
    pub offset: Vec2,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.1,
            max_zoom: 8.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform from canvas to screen coordinates, for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Transform from screen to canvas coordinates, for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        self.inverse_transform() * screen
    }

    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        self.transform() * canvas
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let anchor = self.screen_to_canvas(screen);
        self.zoom = new_zoom;
        let moved = self.canvas_to_screen(anchor);
        self.offset += Vec2::new(screen.x - moved.x, screen.y - moved.y);
    }

    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// Fit the view so `bounds` is fully visible inside `viewport` with
    /// the given padding.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let inner = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        self.zoom = (inner.width / bounds.width())
            .min(inner.height / bounds.height())
            .clamp(self.min_zoom, self.max_zoom);

        let center = bounds.center();
        self.offset = Vec2::new(
            viewport.width / 2.0 - center.x * self.zoom,
            viewport.height / 2.0 - center.y * self.zoom,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let camera = Camera::new();
        let p = Point::new(40.0, 70.0);
        assert_eq!(camera.screen_to_canvas(p), p);
    }

    #[test]
    fn test_pan_shifts_canvas() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(50.0, 100.0));
        let canvas = camera.screen_to_canvas(Point::new(100.0, 200.0));
        assert!((canvas.x - 50.0).abs() < f64::EPSILON);
        assert!((canvas.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(30.0, -20.0);
        camera.zoom = 1.5;

        let original = Point::new(123.0, 456.0);
        let back = camera.canvas_to_screen(camera.screen_to_canvas(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut camera = Camera::new();
        let anchor = Point::new(200.0, 150.0);
        let before = camera.screen_to_canvas(anchor);
        camera.zoom_at(anchor, 2.0);
        let after = camera.screen_to_canvas(anchor);
        assert!((before.x - after.x).abs() < 1e-10);
        assert!((before.y - after.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut camera = Camera::new();
        camera.zoom_at(Point::ZERO, 0.0001);
        assert!((camera.zoom - camera.min_zoom).abs() < f64::EPSILON);
        camera.zoom = 1.0;
        camera.zoom_at(Point::ZERO, 1000.0);
        assert!((camera.zoom - camera.max_zoom).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_bounds() {
        let mut camera = Camera::new();
        camera.fit_to_bounds(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Size::new(500.0, 500.0),
            50.0,
        );
        assert!((camera.zoom - 4.0).abs() < f64::EPSILON);
    }
}
