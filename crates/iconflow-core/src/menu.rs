//! Context menus and text prompts, described declaratively.
//!
//! The controller decides what a menu contains and what each entry does; the
//! host only presents it and reports back the chosen index.

use crate::color::PALETTE;
use crate::diagram::{ConnectorId, NodeId};
use crate::HexColor;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// What a context menu acts on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuTarget {
    Node(NodeId),
    Connector(ConnectorId),
}

/// Operation behind a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuCommand {
    Recolor(HexColor),
    Rename,
    Delete,
}

/// One entry of a context menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuAction {
    pub label: String,
    pub command: MenuCommand,
    /// Rendered with warning styling.
    pub destructive: bool,
}

impl MenuAction {
    fn new(label: impl Into<String>, command: MenuCommand) -> Self {
        Self {
            label: label.into(),
            command,
            destructive: matches!(command, MenuCommand::Delete),
        }
    }
}

/// A dismissible list of actions shown at a screen position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMenu {
    /// Screen position of the right-click.
    pub position: Point,
    pub target: MenuTarget,
    pub actions: Vec<MenuAction>,
}

impl ContextMenu {
    /// Recolor entries, then rename and delete.
    pub fn for_node(node: NodeId, position: Point) -> Self {
        let mut actions = recolor_actions();
        actions.push(MenuAction::new("Rename", MenuCommand::Rename));
        actions.push(MenuAction::new("Delete", MenuCommand::Delete));
        Self {
            position,
            target: MenuTarget::Node(node),
            actions,
        }
    }

    /// Recolor entries, then delete.
    pub fn for_connector(connector: ConnectorId, position: Point) -> Self {
        let mut actions = recolor_actions();
        actions.push(MenuAction::new("Delete", MenuCommand::Delete));
        Self {
            position,
            target: MenuTarget::Connector(connector),
            actions,
        }
    }

    pub fn action(&self, index: usize) -> Option<&MenuAction> {
        self.actions.get(index)
    }
}

fn recolor_actions() -> Vec<MenuAction> {
    PALETTE
        .iter()
        .map(|entry| {
            MenuAction::new(
                format!("Change to {}", entry.label),
                MenuCommand::Recolor(entry.color),
            )
        })
        .collect()
}

/// How a label editor is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditMode {
    /// Input laid over the label itself.
    Inline,
    /// Prompt opened from the context menu.
    Prompt,
}

/// Request to show a text input pre-filled with a node's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextInputRequest {
    pub node: NodeId,
    pub initial: String,
    /// Top-left corner in screen coordinates.
    pub position: Point,
    /// Width in screen pixels.
    pub width: f64,
    pub font_size: f64,
    pub mode: EditMode,
}

/// Menu and text-input widgets provided by the host.
///
/// Results come back as `SemanticEvent::MenuActionChosen`,
/// `MenuDismissed`, `LabelEditCommitted` or `LabelEditCancelled`.
pub trait UiHost {
    fn show_menu(&mut self, menu: &ContextMenu);

    fn close_menu(&mut self);

    fn open_text_input(&mut self, request: &TextInputRequest);

    fn close_text_input(&mut self);
}
