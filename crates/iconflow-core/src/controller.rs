//! Interaction state machine for one editor session.

use crate::diagram::{Diagram, NodeId};
use crate::geometry::{LABEL_FONT_SIZE, LABEL_WIDTH, label_origin};
use crate::input::SemanticEvent;
use crate::menu::{ContextMenu, EditMode, MenuCommand, MenuTarget, TextInputRequest, UiHost};
use crate::viewport::Viewport;
use kurbo::Vec2;

/// Current interaction mode.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    /// Waiting for interaction.
    #[default]
    Idle,
    /// First node of a connector has been chosen.
    AwaitingSecondEndpoint { pending: NodeId },
    /// A node follows the pointer.
    Dragging {
        node: NodeId,
        /// Node anchor minus the grabbed point, in diagram units.
        grab_offset: Vec2,
    },
    /// A text input is open for a node's label.
    EditingLabel { node: NodeId, mode: EditMode },
    /// A context menu is shown.
    MenuOpen { menu: ContextMenu },
}

/// Owns the interaction state and turns semantic events into diagram and
/// viewport mutations.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: InteractionState,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Node waiting for a second endpoint, if any.
    pub fn pending_endpoint(&self) -> Option<&NodeId> {
        match &self.state {
            InteractionState::AwaitingSecondEndpoint { pending } => Some(pending),
            _ => None,
        }
    }

    /// Close any open widget and return to `Idle`.
    pub fn reset(&mut self, ui: &mut dyn UiHost) {
        match std::mem::take(&mut self.state) {
            InteractionState::MenuOpen { .. } => ui.close_menu(),
            InteractionState::EditingLabel { .. } => ui.close_text_input(),
            _ => {}
        }
    }

    pub fn handle(
        &mut self,
        event: SemanticEvent,
        diagram: &mut Diagram,
        viewport: &mut Viewport,
        ui: &mut dyn UiHost,
    ) {
        self.drop_stale(diagram, ui);

        // Allowed in every state, never a transition.
        match event {
            SemanticEvent::Wheel { screen, direction } => {
                viewport.zoom_at(screen, direction);
                return;
            }
            SemanticEvent::Resized(size) => {
                viewport.resize(size);
                return;
            }
            SemanticEvent::IconDropped { icon, screen } => {
                diagram.create_node(icon, viewport.screen_to_diagram(screen), None);
                return;
            }
            _ => {}
        }

        let state = std::mem::take(&mut self.state);
        self.state = match state {
            InteractionState::Idle => from_idle(None, event, diagram, viewport, ui),
            InteractionState::AwaitingSecondEndpoint { pending } => {
                from_idle(Some(pending), event, diagram, viewport, ui)
            }
            InteractionState::Dragging { node, grab_offset } => {
                drag(node, grab_offset, event, diagram, viewport)
            }
            InteractionState::EditingLabel { node, mode } => edit(node, mode, event, diagram, ui),
            InteractionState::MenuOpen { menu } => match event {
                SemanticEvent::MenuActionChosen(index) => {
                    ui.close_menu();
                    run_menu_action(&menu, index, diagram, viewport, ui)
                }
                SemanticEvent::MenuDismissed => InteractionState::Idle,
                SemanticEvent::LabelEditCommitted(_) | SemanticEvent::LabelEditCancelled => {
                    InteractionState::MenuOpen { menu }
                }
                other => {
                    // Clicking outside closes the menu, then the event runs as usual.
                    ui.close_menu();
                    from_idle(None, other, diagram, viewport, ui)
                }
            },
        };
    }

    /// Forget references to entities deleted behind the controller's back.
    fn drop_stale(&mut self, diagram: &Diagram, ui: &mut dyn UiHost) {
        let stale = match &self.state {
            InteractionState::AwaitingSecondEndpoint { pending: node }
            | InteractionState::Dragging { node, .. }
            | InteractionState::EditingLabel { node, .. } => diagram.visible_node(node).is_none(),
            _ => false,
        };
        if stale {
            log::debug!("dropping interaction on deleted node");
            self.reset(ui);
        }
    }
}

fn from_idle(
    pending: Option<NodeId>,
    event: SemanticEvent,
    diagram: &mut Diagram,
    viewport: &Viewport,
    ui: &mut dyn UiHost,
) -> InteractionState {
    let keep = |pending: Option<NodeId>| match pending {
        Some(pending) => InteractionState::AwaitingSecondEndpoint { pending },
        None => InteractionState::Idle,
    };

    match event {
        SemanticEvent::NodeDoubleClicked(node) => {
            if diagram.visible_node(&node).is_none() {
                return keep(pending);
            }
            match pending {
                None => {
                    log::debug!("connector start: node {node}");
                    InteractionState::AwaitingSecondEndpoint { pending: node }
                }
                Some(first) if first == node => {
                    log::debug!("connector cancelled on node {node}");
                    InteractionState::Idle
                }
                Some(first) => {
                    connect(diagram, &first, &node);
                    InteractionState::Idle
                }
            }
        }
        SemanticEvent::DragStarted { node, screen } => {
            let Some(anchor) = diagram.visible_node(&node).map(|n| n.position()) else {
                return keep(pending);
            };
            let grab_offset = anchor - viewport.screen_to_diagram(screen);
            log::debug!("drag start: node {node}");
            InteractionState::Dragging { node, grab_offset }
        }
        SemanticEvent::LabelDoubleClicked(node) => {
            match open_editor(&node, EditMode::Inline, diagram, viewport, ui) {
                Some(state) => state,
                None => keep(pending),
            }
        }
        SemanticEvent::ContextMenuRequested { target, screen } => {
            let menu = match target {
                MenuTarget::Node(node) if diagram.visible_node(&node).is_some() => {
                    ContextMenu::for_node(node, screen)
                }
                MenuTarget::Connector(id)
                    if diagram.connector(id).is_some_and(|c| c.is_visible()) =>
                {
                    ContextMenu::for_connector(id, screen)
                }
                _ => return keep(pending),
            };
            ui.show_menu(&menu);
            InteractionState::MenuOpen { menu }
        }
        _ => keep(pending),
    }
}

fn connect(diagram: &mut Diagram, start: &NodeId, end: &NodeId) {
    let Some(color) = diagram.visible_node(end).map(|n| n.color()) else {
        return;
    };
    if let Err(err) = diagram.create_connector(start, end, color) {
        log::debug!("connector not created: {err}");
    }
}

fn drag(
    node: NodeId,
    grab_offset: Vec2,
    event: SemanticEvent,
    diagram: &mut Diagram,
    viewport: &Viewport,
) -> InteractionState {
    match event {
        SemanticEvent::DragMoved { screen } => {
            let anchor = viewport.screen_to_diagram(screen) + grab_offset;
            if let Err(err) = diagram.move_node(&node, anchor) {
                log::debug!("drag aborted: {err}");
                return InteractionState::Idle;
            }
            InteractionState::Dragging { node, grab_offset }
        }
        SemanticEvent::DragEnded => {
            log::debug!("drag end: node {node}");
            InteractionState::Idle
        }
        _ => InteractionState::Dragging { node, grab_offset },
    }
}

fn edit(
    node: NodeId,
    mode: EditMode,
    event: SemanticEvent,
    diagram: &mut Diagram,
    ui: &mut dyn UiHost,
) -> InteractionState {
    match event {
        SemanticEvent::LabelEditCommitted(text) => {
            ui.close_text_input();
            let name = text.trim();
            if name.is_empty() {
                log::debug!("empty label discarded for node {node}");
            } else if let Err(err) = diagram.rename_node(&node, name) {
                log::debug!("rename skipped: {err}");
            }
            InteractionState::Idle
        }
        SemanticEvent::LabelEditCancelled => {
            ui.close_text_input();
            InteractionState::Idle
        }
        // The host commits on focus loss, so nothing else ends an edit.
        _ => InteractionState::EditingLabel { node, mode },
    }
}

fn open_editor(
    node: &NodeId,
    mode: EditMode,
    diagram: &Diagram,
    viewport: &Viewport,
    ui: &mut dyn UiHost,
) -> Option<InteractionState> {
    let current = diagram.visible_node(node)?;
    let request = TextInputRequest {
        node: node.clone(),
        initial: current.name().to_string(),
        position: viewport.diagram_to_screen(label_origin(current.position())),
        width: LABEL_WIDTH * viewport.scale,
        font_size: LABEL_FONT_SIZE * viewport.scale,
        mode,
    };
    ui.open_text_input(&request);
    log::debug!("editing label of node {node}");
    Some(InteractionState::EditingLabel {
        node: node.clone(),
        mode,
    })
}

fn run_menu_action(
    menu: &ContextMenu,
    index: usize,
    diagram: &mut Diagram,
    viewport: &Viewport,
    ui: &mut dyn UiHost,
) -> InteractionState {
    let Some(action) = menu.action(index) else {
        log::debug!("menu index {index} out of range");
        return InteractionState::Idle;
    };
    let result = match (&menu.target, action.command) {
        (MenuTarget::Node(node), MenuCommand::Recolor(color)) => diagram.recolor_node(node, color),
        (MenuTarget::Node(node), MenuCommand::Delete) => diagram.delete_node(node),
        (MenuTarget::Node(node), MenuCommand::Rename) => {
            return open_editor(node, EditMode::Prompt, diagram, viewport, ui)
                .unwrap_or(InteractionState::Idle);
        }
        (MenuTarget::Connector(id), MenuCommand::Recolor(color)) => {
            diagram.recolor_connector(*id, color)
        }
        (MenuTarget::Connector(id), MenuCommand::Delete) => diagram.delete_connector(*id),
        (MenuTarget::Connector(_), MenuCommand::Rename) => Ok(()),
    };
    if let Err(err) = result {
        log::debug!("menu action '{}' skipped: {err}", action.label);
    }
    InteractionState::Idle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PALETTE;
    use crate::diagram::IconRef;
    use crate::geometry::WheelDirection;
    use crate::input::HitTarget;
    use kurbo::{Point, Size};

    #[derive(Default)]
    struct RecordingUi {
        menus: Vec<ContextMenu>,
        menus_closed: usize,
        inputs: Vec<TextInputRequest>,
        inputs_closed: usize,
    }

    impl UiHost for RecordingUi {
        fn show_menu(&mut self, menu: &ContextMenu) {
            self.menus.push(menu.clone());
        }

        fn close_menu(&mut self) {
            self.menus_closed += 1;
        }

        fn open_text_input(&mut self, request: &TextInputRequest) {
            self.inputs.push(request.clone());
        }

        fn close_text_input(&mut self) {
            self.inputs_closed += 1;
        }
    }

    struct Session {
        controller: InteractionController,
        diagram: Diagram,
        viewport: Viewport,
        ui: RecordingUi,
    }

    impl Session {
        fn new() -> Self {
            let _ = env_logger::builder().is_test(true).try_init();
            Self {
                controller: InteractionController::new(),
                diagram: Diagram::new(),
                viewport: Viewport::default(),
                ui: RecordingUi::default(),
            }
        }

        fn node(&mut self, x: f64, y: f64) -> NodeId {
            self.diagram
                .create_node(IconRef::from("icons/server.svg"), Point::new(x, y), None)
                .id()
                .clone()
        }

        fn send(&mut self, event: SemanticEvent) {
            self.controller
                .handle(event, &mut self.diagram, &mut self.viewport, &mut self.ui);
        }
    }

    #[test]
    fn test_two_double_clicks_create_one_connector() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        let n2 = s.node(300.0, 100.0);
        s.diagram.recolor_node(&n2, PALETTE[1].color).unwrap();

        s.send(SemanticEvent::NodeDoubleClicked(n1.clone()));
        assert_eq!(s.controller.pending_endpoint(), Some(&n1));
        s.send(SemanticEvent::NodeDoubleClicked(n2.clone()));

        assert_eq!(s.controller.state(), &InteractionState::Idle);
        let connectors: Vec<_> = s.diagram.visible_connectors().collect();
        assert_eq!(connectors.len(), 1);
        assert_eq!(connectors[0].start(), &n1);
        assert_eq!(connectors[0].end(), &n2);
        assert_eq!(connectors[0].color(), PALETTE[1].color);
    }

    #[test]
    fn test_double_clicking_same_node_cancels() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);

        s.send(SemanticEvent::NodeDoubleClicked(n1.clone()));
        s.send(SemanticEvent::NodeDoubleClicked(n1));

        assert_eq!(s.controller.pending_endpoint(), None);
        assert_eq!(s.diagram.connector_count(), 0);
    }

    #[test]
    fn test_presses_keep_pending_endpoint() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        s.send(SemanticEvent::NodeDoubleClicked(n1.clone()));
        s.send(SemanticEvent::Pressed {
            screen: Point::new(10.0, 10.0),
            target: None,
        });
        assert_eq!(s.controller.pending_endpoint(), Some(&n1));
    }

    #[test]
    fn test_deleting_pending_node_clears_selection() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        let n2 = s.node(300.0, 100.0);
        s.send(SemanticEvent::NodeDoubleClicked(n1.clone()));
        s.diagram.delete_node(&n1).unwrap();

        s.send(SemanticEvent::NodeDoubleClicked(n2.clone()));
        assert_eq!(s.controller.pending_endpoint(), Some(&n2));
        assert_eq!(s.diagram.connector_count(), 0);
    }

    #[test]
    fn test_drag_moves_node_with_grab_offset() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        s.viewport.scale = 2.0;

        // Grab 10 diagram units right of the anchor.
        s.send(SemanticEvent::DragStarted {
            node: n1.clone(),
            screen: Point::new(220.0, 200.0),
        });
        s.send(SemanticEvent::DragMoved {
            screen: Point::new(320.0, 260.0),
        });
        assert_eq!(
            s.diagram.node(&n1).unwrap().position(),
            Point::new(150.0, 130.0)
        );

        // Zooming mid-drag keeps the drag alive.
        s.send(SemanticEvent::Wheel {
            screen: Point::ZERO,
            direction: WheelDirection::Out,
        });
        assert!(matches!(s.controller.state(), InteractionState::Dragging { .. }));

        s.send(SemanticEvent::DragEnded);
        assert_eq!(s.controller.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_drag_cancels_pending_endpoint() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        let n2 = s.node(300.0, 100.0);
        s.send(SemanticEvent::NodeDoubleClicked(n1));
        s.send(SemanticEvent::DragStarted {
            node: n2,
            screen: Point::new(300.0, 120.0),
        });
        s.send(SemanticEvent::DragEnded);
        assert_eq!(s.controller.pending_endpoint(), None);
    }

    #[test]
    fn test_label_edit_commit_renames() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        s.viewport.scale = 1.5;
        s.viewport.offset = Vec2::new(10.0, 20.0);

        s.send(SemanticEvent::LabelDoubleClicked(n1.clone()));

        let request = s.ui.inputs.last().unwrap();
        assert_eq!(request.initial, "Node 1");
        assert_eq!(request.mode, EditMode::Inline);
        assert_eq!(request.position, Point::new(85.0, 335.0));
        assert!((request.width - 150.0).abs() < 1e-9);
        assert!((request.font_size - 27.0).abs() < 1e-9);

        s.send(SemanticEvent::LabelEditCommitted("  Gateway ".into()));
        assert_eq!(s.diagram.node(&n1).unwrap().name(), "Gateway");
        assert_eq!(s.ui.inputs_closed, 1);
        assert_eq!(s.controller.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_empty_label_is_discarded() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        s.send(SemanticEvent::LabelDoubleClicked(n1.clone()));
        s.diagram.take_events();

        s.send(SemanticEvent::LabelEditCommitted("   ".into()));

        assert_eq!(s.diagram.node(&n1).unwrap().name(), "Node 1");
        assert!(!s.diagram.has_pending_events());
        assert_eq!(s.controller.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_node_menu_recolor_and_delete() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        let n2 = s.node(300.0, 100.0);
        s.diagram.create_connector(&n1, &n2, PALETTE[0].color).unwrap();

        let open = SemanticEvent::ContextMenuRequested {
            target: HitTarget::NodeIcon(n1.clone()).menu_target(),
            screen: Point::new(120.0, 130.0),
        };
        s.send(open.clone());
        assert_eq!(s.ui.menus.len(), 1);
        assert_eq!(s.ui.menus[0].position, Point::new(120.0, 130.0));

        s.send(SemanticEvent::MenuActionChosen(2));
        assert_eq!(s.diagram.node(&n1).unwrap().color(), PALETTE[2].color);
        assert_eq!(s.ui.menus_closed, 1);

        s.send(open);
        s.send(SemanticEvent::MenuActionChosen(4));
        assert!(s.diagram.visible_node(&n1).is_none());
        assert_eq!(s.diagram.visible_connectors().count(), 0);
        assert_eq!(s.controller.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_menu_rename_opens_prompt() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        s.send(SemanticEvent::ContextMenuRequested {
            target: MenuTarget::Node(n1.clone()),
            screen: Point::ZERO,
        });
        s.send(SemanticEvent::MenuActionChosen(3));

        assert_eq!(
            s.controller.state(),
            &InteractionState::EditingLabel {
                node: n1.clone(),
                mode: EditMode::Prompt,
            }
        );
        s.send(SemanticEvent::LabelEditCommitted("Cache".into()));
        assert_eq!(s.diagram.node(&n1).unwrap().name(), "Cache");
    }

    #[test]
    fn test_connector_menu() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        let n2 = s.node(300.0, 100.0);
        let c = s.diagram.create_connector(&n1, &n2, PALETTE[0].color).unwrap();

        let open = SemanticEvent::ContextMenuRequested {
            target: MenuTarget::Connector(c),
            screen: Point::new(200.0, 150.0),
        };
        s.send(open.clone());
        s.send(SemanticEvent::MenuActionChosen(1));
        assert_eq!(s.diagram.connector(c).unwrap().color(), PALETTE[1].color);

        s.send(open);
        s.send(SemanticEvent::MenuActionChosen(3));
        assert!(s.diagram.connector(c).unwrap().is_deleted());
        assert_eq!(s.diagram.visible_nodes().count(), 2);
    }

    #[test]
    fn test_click_outside_closes_menu_without_side_effects() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        s.send(SemanticEvent::ContextMenuRequested {
            target: MenuTarget::Node(n1.clone()),
            screen: Point::ZERO,
        });
        s.diagram.take_events();

        s.send(SemanticEvent::Pressed {
            screen: Point::new(600.0, 500.0),
            target: None,
        });

        assert_eq!(s.controller.state(), &InteractionState::Idle);
        assert_eq!(s.ui.menus_closed, 1);
        assert!(!s.diagram.has_pending_events());
    }

    #[test]
    fn test_new_menu_replaces_previous() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        let n2 = s.node(300.0, 100.0);
        for node in [n1, n2.clone()] {
            s.send(SemanticEvent::ContextMenuRequested {
                target: MenuTarget::Node(node),
                screen: Point::ZERO,
            });
        }
        assert_eq!(s.ui.menus.len(), 2);
        assert_eq!(s.ui.menus_closed, 1);
        match s.controller.state() {
            InteractionState::MenuOpen { menu } => assert_eq!(menu.target, MenuTarget::Node(n2)),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_drop_creates_node_in_diagram_space() {
        let mut s = Session::new();
        s.viewport.scale = 2.0;
        s.viewport.offset = Vec2::new(100.0, 0.0);

        s.send(SemanticEvent::IconDropped {
            icon: IconRef::from("icons/db.svg"),
            screen: Point::new(300.0, 200.0),
        });

        let node = s.diagram.visible_nodes().next().unwrap();
        assert_eq!(node.position(), Point::new(100.0, 100.0));
        assert_eq!(node.icon(), &IconRef::from("icons/db.svg"));
        assert_eq!(s.controller.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_wheel_and_resize_do_not_interrupt_edit() {
        let mut s = Session::new();
        let n1 = s.node(100.0, 100.0);
        s.send(SemanticEvent::LabelDoubleClicked(n1));

        s.send(SemanticEvent::Wheel {
            screen: Point::ZERO,
            direction: WheelDirection::In,
        });
        s.send(SemanticEvent::Resized(Size::new(1024.0, 768.0)));

        assert!((s.viewport.scale - 1.1).abs() < 1e-9);
        assert_eq!(s.viewport.size, Size::new(1024.0, 768.0));
        assert!(matches!(
            s.controller.state(),
            InteractionState::EditingLabel { .. }
        ));
    }

    #[test]
    fn test_stale_menu_results_are_ignored() {
        let mut s = Session::new();
        s.node(100.0, 100.0);
        s.send(SemanticEvent::MenuActionChosen(0));
        s.send(SemanticEvent::LabelEditCommitted("x".into()));
        assert_eq!(s.controller.state(), &InteractionState::Idle);
        assert_eq!(s.diagram.node(&NodeId::from("1")).unwrap().name(), "Node 1");
    }
}
