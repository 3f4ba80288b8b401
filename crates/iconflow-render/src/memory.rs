//! In-memory scene backend.

use crate::scene::{ArrowStyle, PrimitiveId, SceneBackend, TextStyle};
use iconflow_core::geometry::point_to_polyline_dist;
use kurbo::{Affine, Point, Rect, Size};
use peniko::{Color, ImageData};
use std::collections::HashMap;

/// A primitive as recorded by [`MemoryScene`].
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Image {
        bounds: Rect,
        /// Pixel size of the image data.
        pixels: (u32, u32),
    },
    Text {
        text: String,
        origin: Point,
        style: TextStyle,
    },
    Arrow {
        points: Vec<Point>,
        style: ArrowStyle,
        dash_offset: f64,
    },
}

impl Primitive {
    fn contains(&self, point: Point) -> bool {
        match self {
            Primitive::Image { bounds, .. } => bounds.contains(point),
            Primitive::Text { origin, style, .. } => style.bounds(*origin).contains(point),
            Primitive::Arrow { points, style, .. } => {
                point_to_polyline_dist(point, points) <= style.stroke_width / 2.0
            }
        }
    }
}

/// Scene backend that keeps primitives in memory, for headless hosts and
/// tests. Hit testing is geometric.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    next_id: u64,
    primitives: HashMap<PrimitiveId, Primitive>,
    /// Bottom to top.
    order: Vec<PrimitiveId>,
    transform: Affine,
    size: Size,
    draws: usize,
    created: usize,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self {
            next_id: 0,
            primitives: HashMap::new(),
            order: Vec::new(),
            transform: Affine::IDENTITY,
            size: Size::ZERO,
            draws: 0,
            created: 0,
        }
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitive(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(&id)
    }

    /// Live primitives, bottom to top.
    pub fn primitives(&self) -> impl Iterator<Item = (PrimitiveId, &Primitive)> {
        self.order
            .iter()
            .filter_map(|id| self.primitives.get(id).map(|p| (*id, p)))
    }

    /// Number of live primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Position in the stacking order, 0 being the bottom.
    pub fn z_index(&self, id: PrimitiveId) -> Option<usize> {
        self.order.iter().position(|p| *p == id)
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Number of `batch_draw` calls so far.
    pub fn draw_count(&self) -> usize {
        self.draws
    }

    /// Number of primitives ever created.
    pub fn created_count(&self) -> usize {
        self.created
    }

    fn insert(&mut self, primitive: Primitive) -> PrimitiveId {
        self.next_id += 1;
        self.created += 1;
        let id = PrimitiveId(self.next_id);
        self.primitives.insert(id, primitive);
        self.order.push(id);
        id
    }
}

impl SceneBackend for MemoryScene {
    fn create_image(&mut self, image: &ImageData, bounds: Rect) -> PrimitiveId {
        self.insert(Primitive::Image {
            bounds,
            pixels: (image.width, image.height),
        })
    }

    fn create_text(&mut self, text: &str, origin: Point, style: &TextStyle) -> PrimitiveId {
        self.insert(Primitive::Text {
            text: text.to_string(),
            origin,
            style: style.clone(),
        })
    }

    fn create_arrow(&mut self, points: &[Point], style: &ArrowStyle) -> PrimitiveId {
        self.insert(Primitive::Arrow {
            points: points.to_vec(),
            style: *style,
            dash_offset: 0.0,
        })
    }

    fn set_points(&mut self, id: PrimitiveId, new_points: &[Point]) {
        if let Some(Primitive::Arrow { points, .. }) = self.primitives.get_mut(&id) {
            *points = new_points.to_vec();
        }
    }

    fn set_position(&mut self, id: PrimitiveId, position: Point) {
        match self.primitives.get_mut(&id) {
            Some(Primitive::Image { bounds, .. }) => *bounds = bounds.with_origin(position),
            Some(Primitive::Text { origin, .. }) => *origin = position,
            _ => {}
        }
    }

    fn set_text(&mut self, id: PrimitiveId, new_text: &str) {
        if let Some(Primitive::Text { text, .. }) = self.primitives.get_mut(&id) {
            *text = new_text.to_string();
        }
    }

    fn set_stroke(&mut self, id: PrimitiveId, color: Color) {
        if let Some(Primitive::Arrow { style, .. }) = self.primitives.get_mut(&id) {
            style.color = color;
        }
    }

    fn set_dash_offset(&mut self, id: PrimitiveId, offset: f64) {
        if let Some(Primitive::Arrow { dash_offset, .. }) = self.primitives.get_mut(&id) {
            *dash_offset = offset;
        }
    }

    fn move_to_bottom(&mut self, id: PrimitiveId) {
        if let Some(index) = self.z_index(id) {
            self.order.remove(index);
            self.order.insert(0, id);
        }
    }

    fn destroy(&mut self, id: PrimitiveId) {
        if self.primitives.remove(&id).is_some() {
            self.order.retain(|p| *p != id);
        }
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn resize(&mut self, size: Size) {
        self.size = size;
    }

    fn hit_test(&self, screen: Point) -> Option<PrimitiveId> {
        let point = self.transform.inverse() * screen;
        self.order
            .iter()
            .rev()
            .find(|id| self.primitives.get(id).is_some_and(|p| p.contains(point)))
            .copied()
    }

    fn batch_draw(&mut self) {
        self.draws += 1;
    }
}
