//! Raw host events and their translation into editor gestures.

use crate::diagram::{ConnectorId, IconRef, NodeId};
use crate::geometry::WheelDirection;
use crate::menu::MenuTarget;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event as reported by the host, in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        /// Host timestamp in milliseconds, used for double-click detection.
        time_ms: f64,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
    /// Pointer left the stage.
    Leave,
}

/// Everything the host can feed into the editor from the canvas surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawEvent {
    Pointer(PointerEvent),
    /// An icon dragged from the palette was released over the canvas.
    Drop { position: Point, icon: IconRef },
    /// The container box changed size.
    Resize(Size),
}

/// Entity under the pointer, as resolved from the scene graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitTarget {
    NodeIcon(NodeId),
    NodeLabel(NodeId),
    Connector(ConnectorId),
}

impl HitTarget {
    /// The menu a right-click on this target opens. Labels belong to their node.
    pub fn menu_target(&self) -> MenuTarget {
        match self {
            HitTarget::NodeIcon(id) | HitTarget::NodeLabel(id) => MenuTarget::Node(id.clone()),
            HitTarget::Connector(id) => MenuTarget::Connector(*id),
        }
    }
}

/// Editor-level events consumed by the interaction controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SemanticEvent {
    /// Any primary press; closes an open menu.
    Pressed {
        screen: Point,
        target: Option<HitTarget>,
    },
    NodeDoubleClicked(NodeId),
    LabelDoubleClicked(NodeId),
    DragStarted {
        node: NodeId,
        screen: Point,
    },
    DragMoved {
        screen: Point,
    },
    DragEnded,
    ContextMenuRequested {
        target: MenuTarget,
        screen: Point,
    },
    /// Reported by the menu widget.
    MenuActionChosen(usize),
    /// Reported by the menu widget when it was closed without a choice.
    MenuDismissed,
    /// Reported by the text input on Enter or focus loss.
    LabelEditCommitted(String),
    LabelEditCancelled,
    IconDropped {
        icon: IconRef,
        screen: Point,
    },
    Wheel {
        screen: Point,
        direction: WheelDirection,
    },
    Resized(Size),
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: f64 = 500.0;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;
const DRAG_THRESHOLD: f64 = 3.0;

/// Gesture thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Maximum time between the two presses of a double-click.
    pub double_click_ms: f64,
    /// Maximum pointer travel between the two presses of a double-click.
    pub double_click_distance: f64,
    /// Pointer travel after which a press on a node becomes a drag.
    pub drag_threshold: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_click_ms: DOUBLE_CLICK_TIME_MS,
            double_click_distance: DOUBLE_CLICK_DISTANCE,
            drag_threshold: DRAG_THRESHOLD,
        }
    }
}

impl GestureConfig {
    pub fn with_double_click(mut self, time_ms: f64, distance: f64) -> Self {
        self.double_click_ms = time_ms;
        self.double_click_distance = distance;
        self
    }

    pub fn with_drag_threshold(mut self, threshold: f64) -> Self {
        self.drag_threshold = threshold;
        self
    }
}

#[derive(Debug, Clone)]
struct Press {
    position: Point,
    target: Option<HitTarget>,
    dragging: bool,
}

#[derive(Debug, Clone)]
struct Click {
    time_ms: f64,
    position: Point,
    target: HitTarget,
}

/// Turns raw pointer streams into clicks, double-clicks and drags.
#[derive(Debug, Clone, Default)]
pub struct GestureRecognizer {
    config: GestureConfig,
    /// Primary button press in progress.
    press: Option<Press>,
    /// Last primary click for double-click detection.
    last_click: Option<Click>,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            press: None,
            last_click: None,
        }
    }

    /// Whether a node drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.press.as_ref().is_some_and(|p| p.dragging)
    }

    /// Process one raw event. `target` is whatever the scene reports under
    /// the pointer for this event.
    pub fn feed(&mut self, event: &RawEvent, target: Option<HitTarget>) -> Vec<SemanticEvent> {
        match event {
            RawEvent::Pointer(pointer) => self.feed_pointer(pointer, target),
            RawEvent::Drop { position, icon } => vec![SemanticEvent::IconDropped {
                icon: icon.clone(),
                screen: *position,
            }],
            RawEvent::Resize(size) => vec![SemanticEvent::Resized(*size)],
        }
    }

    fn feed_pointer(
        &mut self,
        event: &PointerEvent,
        target: Option<HitTarget>,
    ) -> Vec<SemanticEvent> {
        match *event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
                time_ms,
            } => {
                let mut out = vec![SemanticEvent::Pressed {
                    screen: position,
                    target: target.clone(),
                }];
                if let Some(hit) = &target {
                    if self.is_double_click(time_ms, position, hit) {
                        self.last_click = None;
                        match hit {
                            HitTarget::NodeIcon(id) => {
                                out.push(SemanticEvent::NodeDoubleClicked(id.clone()))
                            }
                            HitTarget::NodeLabel(id) => {
                                out.push(SemanticEvent::LabelDoubleClicked(id.clone()))
                            }
                            HitTarget::Connector(_) => {}
                        }
                    } else {
                        self.last_click = Some(Click {
                            time_ms,
                            position,
                            target: hit.clone(),
                        });
                    }
                } else {
                    self.last_click = None;
                }
                self.press = Some(Press {
                    position,
                    target,
                    dragging: false,
                });
                out
            }
            PointerEvent::Down {
                position,
                button: MouseButton::Right,
                ..
            } => match target {
                Some(hit) => vec![SemanticEvent::ContextMenuRequested {
                    target: hit.menu_target(),
                    screen: position,
                }],
                None => vec![SemanticEvent::Pressed {
                    screen: position,
                    target: None,
                }],
            },
            PointerEvent::Down { .. } => Vec::new(),
            PointerEvent::Move { position } => self.pointer_moved(position),
            PointerEvent::Up {
                button: MouseButton::Left,
                ..
            }
            | PointerEvent::Leave => match self.press.take() {
                Some(press) if press.dragging => vec![SemanticEvent::DragEnded],
                _ => Vec::new(),
            },
            PointerEvent::Up { .. } => Vec::new(),
            PointerEvent::Scroll { position, delta } => {
                if delta.y == 0.0 {
                    return Vec::new();
                }
                vec![SemanticEvent::Wheel {
                    screen: position,
                    direction: WheelDirection::from_delta(delta.y),
                }]
            }
        }
    }

    fn pointer_moved(&mut self, position: Point) -> Vec<SemanticEvent> {
        let Some(press) = self.press.as_mut() else {
            return Vec::new();
        };
        if press.dragging {
            return vec![SemanticEvent::DragMoved { screen: position }];
        }
        let Some(HitTarget::NodeIcon(node)) = &press.target else {
            return Vec::new();
        };
        if (position - press.position).hypot() < self.config.drag_threshold {
            return Vec::new();
        }
        press.dragging = true;
        let started = SemanticEvent::DragStarted {
            node: node.clone(),
            screen: press.position,
        };
        // A drag is not a click.
        self.last_click = None;
        vec![started, SemanticEvent::DragMoved { screen: position }]
    }

    fn is_double_click(&self, time_ms: f64, position: Point, target: &HitTarget) -> bool {
        let Some(last) = &self.last_click else {
            return false;
        };
        time_ms - last.time_ms < self.config.double_click_ms
            && (position - last.position).hypot() < self.config.double_click_distance
            && &last.target == target
    }
}
