//! Scene-graph abstraction the render adapter drives.

use kurbo::{Affine, Point, Rect, Size};
use peniko::{Color, ImageData};
use std::fmt;
use thiserror::Error;

/// Render errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("Rasterizing {icon} failed: {reason}")]
    Rasterize { icon: String, reason: String },
    #[error("Export failed: {0}")]
    Export(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Handle to a primitive owned by a scene backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub u64);

impl fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Stroke and head of a connector arrow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowStyle {
    pub color: Color,
    pub stroke_width: f64,
    /// Dash and gap length.
    pub dash: [f64; 2],
    pub pointer_length: f64,
    pub pointer_width: f64,
}

/// Centered label text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub color: Color,
    /// Box width the text is centered in.
    pub width: f64,
}

impl TextStyle {
    /// Box occupied by the text when its top-left corner is at `origin`.
    pub fn bounds(&self, origin: Point) -> Rect {
        Rect::from_origin_size(origin, Size::new(self.width, self.font_size * 1.25))
    }
}

/// Visual tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub label_font_family: String,
    pub label_font_size: f64,
    pub label_color: Color,
    pub label_width: f64,
    pub arrow_stroke_width: f64,
    pub arrow_dash: [f64; 2],
    pub arrow_pointer_size: f64,
    /// Milliseconds per unit of dash offset.
    pub dash_speed_ms: f64,
    /// Offset after which the dash pattern repeats.
    pub dash_cycle: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            label_font_family: "Calibri".to_string(),
            label_font_size: iconflow_core::geometry::LABEL_FONT_SIZE,
            label_color: Color::from_rgba8(0, 0, 0, 255),
            label_width: iconflow_core::geometry::LABEL_WIDTH,
            arrow_stroke_width: 15.0,
            arrow_dash: [30.0, 5.0],
            arrow_pointer_size: 10.0,
            dash_speed_ms: 45.0,
            dash_cycle: 35.0,
        }
    }
}

impl RenderConfig {
    /// Set the label font.
    pub fn with_label_font(mut self, family: impl Into<String>, size: f64) -> Self {
        self.label_font_family = family.into();
        self.label_font_size = size;
        self
    }

    /// Set the label color.
    pub fn with_label_color(mut self, color: Color) -> Self {
        self.label_color = color;
        self
    }

    /// Set the arrow stroke width and dash pattern.
    pub fn with_arrow_stroke(mut self, width: f64, dash: [f64; 2]) -> Self {
        self.arrow_stroke_width = width;
        self.arrow_dash = dash;
        self
    }

    /// Set the dash animation speed and cycle length.
    pub fn with_dash_animation(mut self, speed_ms: f64, cycle: f64) -> Self {
        self.dash_speed_ms = speed_ms;
        self.dash_cycle = cycle;
        self
    }

    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font_family: self.label_font_family.clone(),
            font_size: self.label_font_size,
            color: self.label_color,
            width: self.label_width,
        }
    }

    pub fn arrow_style(&self, color: Color) -> ArrowStyle {
        ArrowStyle {
            color,
            stroke_width: self.arrow_stroke_width,
            dash: self.arrow_dash,
            pointer_length: self.arrow_pointer_size,
            pointer_width: self.arrow_pointer_size,
        }
    }
}

/// Retained-mode scene graph provided by the host.
///
/// Primitive geometry is given in diagram coordinates; the stage transform
/// maps it to the screen. Operations on unknown ids are ignored.
pub trait SceneBackend {
    /// Add an image whose top-left corner and size come from `bounds`.
    fn create_image(&mut self, image: &ImageData, bounds: Rect) -> PrimitiveId;

    /// Add a text primitive with its top-left corner at `origin`.
    fn create_text(&mut self, text: &str, origin: Point, style: &TextStyle) -> PrimitiveId;

    /// Add a polyline with an arrow head at its last point.
    fn create_arrow(&mut self, points: &[Point], style: &ArrowStyle) -> PrimitiveId;

    fn set_points(&mut self, id: PrimitiveId, points: &[Point]);

    /// Move the top-left corner of an image or text primitive.
    fn set_position(&mut self, id: PrimitiveId, origin: Point);

    fn set_text(&mut self, id: PrimitiveId, text: &str);

    /// Restyle stroke and head fill of an arrow.
    fn set_stroke(&mut self, id: PrimitiveId, color: Color);

    fn set_dash_offset(&mut self, id: PrimitiveId, offset: f64);

    /// Put a primitive underneath every other one.
    fn move_to_bottom(&mut self, id: PrimitiveId);

    fn destroy(&mut self, id: PrimitiveId);

    /// Diagram-to-screen transform of the whole stage.
    fn set_transform(&mut self, transform: Affine);

    fn resize(&mut self, size: Size);

    /// Topmost primitive under a screen position.
    fn hit_test(&self, screen: Point) -> Option<PrimitiveId>;

    /// Paint every pending change in one pass.
    fn batch_draw(&mut self);
}
