//! Screen/diagram transform with wheel zoom.

use crate::geometry::{self, WheelDirection, ZoomLimits};
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Tunables for the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Zoom step and clamp range.
    pub zoom: ZoomLimits,
    /// Stage size used until the host reports its container box.
    pub initial_size: Size,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomLimits::default(),
            initial_size: Size::new(800.0, 600.0),
        }
    }
}

impl ViewportConfig {
    /// Set the zoom step and clamp range.
    pub fn with_zoom(mut self, zoom: ZoomLimits) -> Self {
        self.zoom = zoom;
        self
    }

    /// Set the initial stage size.
    pub fn with_initial_size(mut self, size: Size) -> Self {
        self.initial_size = size;
        self
    }
}

/// Viewport holds the screen ↔ diagram transform.
///
/// `screen = diagram * scale + offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current translation offset (pan), in screen pixels.
    pub offset: Vec2,
    /// Current zoom level.
    pub scale: f64,
    /// Size of the rendering surface.
    pub size: Size,
    config: ViewportConfig,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    /// Create a viewport at scale 1 with no pan.
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            size: config.initial_size,
            config,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Transform from diagram to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Transform from screen to diagram coordinates.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    pub fn screen_to_diagram(&self, screen: Point) -> Point {
        geometry::screen_to_diagram(screen, self.offset, self.scale)
    }

    pub fn diagram_to_screen(&self, diagram: Point) -> Point {
        geometry::diagram_to_screen(diagram, self.offset, self.scale)
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Apply one wheel step, keeping the point under `pointer` fixed.
    ///
    /// Returns whether the scale changed.
    pub fn zoom_at(&mut self, pointer: Point, direction: WheelDirection) -> bool {
        let (scale, offset) =
            geometry::apply_zoom(self.scale, pointer, self.offset, direction, self.config.zoom);
        let changed = (scale - self.scale).abs() > f64::EPSILON;
        self.scale = scale;
        self.offset = offset;
        changed
    }

    /// Track the container's current box.
    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    /// Reset pan and zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = 1.0;
    }
}
