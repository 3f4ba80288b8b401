//! iconflow core library
//!
//! Platform-agnostic diagram model, geometry and interaction engine for the
//! iconflow editor. Rendering lives in `iconflow-render`.

pub mod color;
pub mod controller;
pub mod diagram;
pub mod error;
pub mod geometry;
pub mod input;
pub mod menu;
pub mod viewport;

pub use color::{DEFAULT_NODE_COLOR, HexColor, PALETTE, PaletteEntry};
pub use controller::{InteractionController, InteractionState};
pub use diagram::{Connector, ConnectorId, Diagram, DiagramEvent, IconRef, Node, NodeId};
pub use error::{ColorError, DiagramError, DiagramResult, EntityRef, InvalidConnection};
pub use geometry::{NODE_RADIUS, WheelDirection, ZoomLimits};
pub use input::{
    GestureConfig, GestureRecognizer, HitTarget, MouseButton, PointerEvent, RawEvent,
    SemanticEvent,
};
pub use menu::{ContextMenu, EditMode, MenuAction, MenuCommand, MenuTarget, TextInputRequest, UiHost};
pub use viewport::{Viewport, ViewportConfig};
