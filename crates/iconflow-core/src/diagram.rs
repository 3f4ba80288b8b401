//! Diagram document: nodes, connectors and their soft-delete state.

use crate::color::{DEFAULT_NODE_COLOR, HexColor};
use crate::error::{DiagramError, DiagramResult, EntityRef, InvalidConnection};
use crate::geometry::{self, NODE_RADIUS};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Stable node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Connector handle. Connectors never leave the document before a reset, so
/// the handle stays valid for tombstones too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectorId(u64);

impl ConnectorId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Reference to a vector icon asset, as handed out by the icon palette.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconRef(String);

impl IconRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IconRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IconRef {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

/// A labeled, tinted icon placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    /// Top-middle anchor of the icon box, in diagram coordinates. A top-left
    /// reading of the anchor would route the two-node example from
    /// (200,150) to (300,150) instead of (150,150) to (250,150), so the icon
    /// is centered horizontally on it.
    pub(crate) position: Point,
    pub(crate) icon: IconRef,
    pub(crate) color: HexColor,
    pub(crate) deleted: bool,
}

impl Node {
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn icon(&self) -> &IconRef {
        &self.icon
    }

    pub fn color(&self) -> HexColor {
        self.color
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_visible(&self) -> bool {
        !self.deleted
    }
}

/// Directed arrow between two nodes. Endpoints are weak references by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub(crate) id: ConnectorId,
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
    pub(crate) color: HexColor,
    pub(crate) deleted: bool,
}

impl Connector {
    pub fn id(&self) -> ConnectorId {
        self.id
    }

    pub fn start(&self) -> &NodeId {
        &self.start
    }

    pub fn end(&self) -> &NodeId {
        &self.end
    }

    pub fn color(&self) -> HexColor {
        self.color
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_visible(&self) -> bool {
        !self.deleted
    }

    /// Whether either endpoint refers to `node`.
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.start == node || &self.end == node
    }
}

/// Change notifications consumed by the render adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramEvent {
    NodeAdded(NodeId),
    NodeMoved(NodeId),
    NodeRenamed(NodeId),
    /// The icon must be re-rasterized, not just restyled.
    NodeRecolored(NodeId),
    NodeDeleted(NodeId),
    ConnectorAdded(ConnectorId),
    /// Style-only change of the path and its arrowhead.
    ConnectorRecolored(ConnectorId),
    ConnectorDeleted(ConnectorId),
    ConnectorRemapped(ConnectorId),
    Cleared,
}

/// The authoritative diagram state for one editor session.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    nodes: HashMap<NodeId, Node>,
    /// Creation order of nodes.
    node_order: Vec<NodeId>,
    connectors: HashMap<ConnectorId, Connector>,
    /// Creation order of connectors.
    connector_order: Vec<ConnectorId>,
    /// Last issued node number. Survives `reset` so ids stay unique.
    node_counter: u64,
    connector_counter: u64,
    events: Vec<DiagramEvent>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with the next id. The default name is `Node <n>`.
    pub fn create_node(
        &mut self,
        icon: IconRef,
        position: Point,
        color: Option<HexColor>,
    ) -> &Node {
        self.node_counter += 1;
        let id = NodeId(self.node_counter.to_string());
        let node = Node {
            id: id.clone(),
            name: format!("Node {}", self.node_counter),
            position,
            icon,
            color: color.unwrap_or(DEFAULT_NODE_COLOR),
            deleted: false,
        };
        log::debug!("node {id} created at ({:.1}, {:.1})", position.x, position.y);
        self.node_order.push(id.clone());
        self.events.push(DiagramEvent::NodeAdded(id.clone()));
        self.nodes.entry(id).or_insert(node)
    }

    /// Move a visible node to a new anchor position.
    pub fn move_node(&mut self, id: &NodeId, position: Point) -> DiagramResult<()> {
        let node = self.visible_node_mut(id)?;
        node.position = position;
        self.events.push(DiagramEvent::NodeMoved(id.clone()));
        Ok(())
    }

    /// Soft-delete a node together with every connector that touches it.
    ///
    /// Deleting an already deleted node does nothing.
    pub fn delete_node(&mut self, id: &NodeId) -> DiagramResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| DiagramError::StaleReference(EntityRef::Node(id.clone())))?;
        if node.deleted {
            return Ok(());
        }
        node.deleted = true;
        self.events.push(DiagramEvent::NodeDeleted(id.clone()));

        for connector_id in &self.connector_order {
            if let Some(connector) = self.connectors.get_mut(connector_id) {
                if !connector.deleted && connector.touches(id) {
                    connector.deleted = true;
                    self.events.push(DiagramEvent::ConnectorDeleted(*connector_id));
                }
            }
        }
        log::debug!("node {id} deleted");
        Ok(())
    }

    /// Change a node's tint. The icon has to be regenerated.
    pub fn recolor_node(&mut self, id: &NodeId, color: HexColor) -> DiagramResult<()> {
        let node = self.visible_node_mut(id)?;
        node.color = color;
        self.events.push(DiagramEvent::NodeRecolored(id.clone()));
        Ok(())
    }

    /// Change a node's label.
    pub fn rename_node(&mut self, id: &NodeId, name: impl Into<String>) -> DiagramResult<()> {
        let node = self.visible_node_mut(id)?;
        node.name = name.into();
        self.events.push(DiagramEvent::NodeRenamed(id.clone()));
        Ok(())
    }

    /// Connect two distinct visible nodes.
    pub fn create_connector(
        &mut self,
        start: &NodeId,
        end: &NodeId,
        color: HexColor,
    ) -> DiagramResult<ConnectorId> {
        if start == end {
            return Err(InvalidConnection::SelfLoop(start.clone()).into());
        }
        for endpoint in [start, end] {
            if self.visible_node(endpoint).is_none() {
                return Err(InvalidConnection::Unresolved(endpoint.clone()).into());
            }
        }

        self.connector_counter += 1;
        let id = ConnectorId(self.connector_counter);
        self.connectors.insert(
            id,
            Connector {
                id,
                start: start.clone(),
                end: end.clone(),
                color,
                deleted: false,
            },
        );
        self.connector_order.push(id);
        self.events.push(DiagramEvent::ConnectorAdded(id));
        log::debug!("connector {id} created: {start} -> {end}");
        Ok(id)
    }

    /// Soft-delete a connector. Idempotent.
    pub fn delete_connector(&mut self, id: ConnectorId) -> DiagramResult<()> {
        let connector = self
            .connectors
            .get_mut(&id)
            .ok_or(DiagramError::StaleReference(EntityRef::Connector(id)))?;
        if !connector.deleted {
            connector.deleted = true;
            self.events.push(DiagramEvent::ConnectorDeleted(id));
        }
        Ok(())
    }

    /// Change a connector's tint.
    pub fn recolor_connector(&mut self, id: ConnectorId, color: HexColor) -> DiagramResult<()> {
        let connector = self
            .connectors
            .get_mut(&id)
            .filter(|c| !c.deleted)
            .ok_or(DiagramError::StaleReference(EntityRef::Connector(id)))?;
        connector.color = color;
        self.events.push(DiagramEvent::ConnectorRecolored(id));
        Ok(())
    }

    /// Replace `old` with `new` in every connector endpoint, tombstones
    /// included. Node existence is untouched. Returns how many connectors
    /// changed.
    ///
    /// A visible connector that ends up on a hidden or unknown node, or on
    /// the same node at both ends, is soft-deleted.
    pub fn remap_connector_endpoint(&mut self, old: &NodeId, new: &NodeId) -> usize {
        if old == new {
            return 0;
        }
        let target_visible = self.visible_node(new).is_some();
        let mut changed = 0;
        for connector_id in &self.connector_order {
            let Some(connector) = self.connectors.get_mut(connector_id) else {
                continue;
            };
            if !connector.touches(old) {
                continue;
            }
            if &connector.start == old {
                connector.start = new.clone();
            }
            if &connector.end == old {
                connector.end = new.clone();
            }
            log::debug!("connector {connector_id} remapped from {old} to {new}");
            self.events.push(DiagramEvent::ConnectorRemapped(*connector_id));
            if !connector.deleted && (!target_visible || connector.start == connector.end) {
                log::debug!("connector {connector_id} dropped: endpoint {new} not connectable");
                connector.deleted = true;
                self.events.push(DiagramEvent::ConnectorDeleted(*connector_id));
            }
            changed += 1;
        }
        changed
    }

    /// Drop every node and connector, starting a new diagram.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.node_order.clear();
        self.connectors.clear();
        self.connector_order.clear();
        self.events.clear();
        self.events.push(DiagramEvent::Cleared);
        log::info!("diagram cleared");
    }

    /// Drain pending change notifications.
    pub fn take_events(&mut self) -> Vec<DiagramEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether change notifications are waiting to be drained.
    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Look up a node, tombstones included.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a node only if it is not deleted.
    pub fn visible_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id).filter(|n| n.is_visible())
    }

    /// Look up a connector, tombstones included.
    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(&id)
    }

    /// Non-deleted nodes in creation order.
    pub fn visible_nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|n| n.is_visible())
    }

    /// Non-deleted connectors in creation order.
    pub fn visible_connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connector_order
            .iter()
            .filter_map(|id| self.connectors.get(id))
            .filter(|c| c.is_visible())
    }

    /// Non-deleted connectors with `node` as one endpoint.
    pub fn connectors_touching<'a>(
        &'a self,
        node: &'a NodeId,
    ) -> impl Iterator<Item = &'a Connector> + 'a {
        self.visible_connectors().filter(move |c| c.touches(node))
    }

    /// Routed path of a connector, if both endpoints are visible.
    pub fn connector_path(&self, id: ConnectorId) -> Option<[Point; 4]> {
        let connector = self.connectors.get(&id)?;
        let start = self.visible_node(&connector.start)?;
        let end = self.visible_node(&connector.end)?;
        Some(geometry::connector_path(
            start.position,
            end.position,
            NODE_RADIUS,
        ))
    }

    /// Number of nodes, tombstones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of connectors, tombstones included.
    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    /// Check if the diagram has no entities at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connectors.is_empty()
    }

    fn visible_node_mut(&mut self, id: &NodeId) -> DiagramResult<&mut Node> {
        self.nodes
            .get_mut(id)
            .filter(|n| n.is_visible())
            .ok_or_else(|| DiagramError::StaleReference(EntityRef::Node(id.clone())))
    }
}
