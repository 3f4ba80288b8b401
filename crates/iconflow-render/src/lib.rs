//! iconflow render library
//!
//! Projects an `iconflow_core::Diagram` onto a retained scene graph and ties
//! the editor session together. Backends implement [`SceneBackend`];
//! [`MemoryScene`] is a headless one.

pub mod adapter;
pub mod animation;
pub mod editor;
pub mod export;
pub mod icons;
pub mod memory;
mod scene;

#[cfg(test)]
mod testing;

pub use adapter::RenderAdapter;
pub use animation::{AnimationClock, dash_offset};
pub use editor::{Editor, EditorConfig};
pub use export::{EXPORT_FILE_NAME, ExportService};
pub use icons::{IconRasterizer, RasterTicket, recolor_svg};
pub use memory::{MemoryScene, Primitive};
pub use scene::{
    ArrowStyle, PrimitiveId, RenderConfig, RenderError, RenderResult, SceneBackend, TextStyle,
};
