//! Projection of the diagram onto a scene backend.

use crate::animation::{AnimationClock, dash_offset};
use crate::icons::{IconRasterizer, RasterTicket};
use crate::scene::{PrimitiveId, RenderConfig, RenderError, SceneBackend};
use iconflow_core::geometry::{icon_rect, label_origin};
use iconflow_core::{
    ConnectorId, Diagram, DiagramEvent, HexColor, HitTarget, IconRef, NodeId, Viewport,
};
use kurbo::{Affine, Point, Size};
use peniko::{Color, ImageData};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct NodeVisual {
    icon: PrimitiveId,
    label: PrimitiveId,
    /// Icon and tint the image was rasterized for.
    key: (IconRef, HexColor),
}

#[derive(Debug, Clone, Copy)]
struct ConnectorVisual {
    arrow: PrimitiveId,
    /// Animation time when the arrow was created.
    started_ms: f64,
}

#[derive(Debug, Clone)]
struct RasterRequest {
    node: NodeId,
    icon: IconRef,
    color: HexColor,
}

/// Keeps one visual per visible entity in a [`SceneBackend`].
///
/// A node becomes visible only once its recolored icon has been rasterized;
/// until then nothing can be hit on it. Operations against entities without
/// a visual are skipped.
pub struct RenderAdapter<S> {
    scene: S,
    config: RenderConfig,
    nodes: HashMap<NodeId, NodeVisual>,
    connectors: HashMap<ConnectorId, ConnectorVisual>,
    /// Which entity each primitive belongs to.
    owners: HashMap<PrimitiveId, HitTarget>,
    requests: HashMap<RasterTicket, RasterRequest>,
    /// Newest ticket per node. Older completions are superseded.
    latest: HashMap<NodeId, RasterTicket>,
    next_ticket: u64,
    image_cache: HashMap<(IconRef, HexColor), ImageData>,
    clock: AnimationClock,
    transform: Option<Affine>,
    size: Option<Size>,
}

impl<S: SceneBackend> RenderAdapter<S> {
    pub fn new(scene: S, config: RenderConfig) -> Self {
        Self {
            scene,
            config,
            nodes: HashMap::new(),
            connectors: HashMap::new(),
            owners: HashMap::new(),
            requests: HashMap::new(),
            latest: HashMap::new(),
            next_ticket: 0,
            image_cache: HashMap::new(),
            clock: AnimationClock::new(),
            transform: None,
            size: None,
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Patch the scene with every pending diagram change, then paint once.
    pub fn apply(&mut self, diagram: &mut Diagram, rasterizer: &mut dyn IconRasterizer) {
        let events = diagram.take_events();
        if events.is_empty() {
            return;
        }
        for event in events {
            match event {
                DiagramEvent::NodeAdded(id) | DiagramEvent::NodeRecolored(id) => {
                    self.request_node(diagram, &id, rasterizer)
                }
                DiagramEvent::NodeMoved(id) => self.move_node(diagram, &id),
                DiagramEvent::NodeRenamed(id) => self.rename_node(diagram, &id),
                DiagramEvent::NodeDeleted(id) => {
                    self.latest.remove(&id);
                    self.destroy_node(&id);
                }
                DiagramEvent::ConnectorAdded(id) => self.create_connector(diagram, id),
                DiagramEvent::ConnectorRecolored(id) => self.recolor_connector(diagram, id),
                DiagramEvent::ConnectorDeleted(id) => self.destroy_connector(id),
                DiagramEvent::ConnectorRemapped(id) => {
                    if self.connectors.contains_key(&id) {
                        self.patch_connector(diagram, id);
                    } else {
                        self.create_connector(diagram, id);
                    }
                }
                DiagramEvent::Cleared => self.clear(),
            }
        }
        self.scene.batch_draw();
    }

    /// Destroy every primitive and rebuild one visual per visible entity.
    pub fn redraw_diagram(&mut self, diagram: &mut Diagram, rasterizer: &mut dyn IconRasterizer) {
        // Everything queued is covered by the rebuild.
        diagram.take_events();
        self.clear();
        let nodes: Vec<NodeId> = diagram.visible_nodes().map(|n| n.id().clone()).collect();
        for id in &nodes {
            self.request_node(diagram, id, rasterizer);
        }
        let connectors: Vec<ConnectorId> = diagram.visible_connectors().map(|c| c.id()).collect();
        for id in connectors {
            self.create_connector(diagram, id);
        }
        log::debug!(
            "redraw: {} nodes, {} connectors",
            nodes.len(),
            self.connectors.len()
        );
        self.scene.batch_draw();
    }

    /// Recompute the points of existing arrows in place.
    pub fn update_connectors(&mut self, diagram: &Diagram) {
        let ids: Vec<ConnectorId> = self.connectors.keys().copied().collect();
        for id in ids {
            self.patch_connector(diagram, id);
        }
        self.scene.batch_draw();
    }

    /// Bring the scene in line with the diagram without draining its events.
    ///
    /// Visuals of entities that are gone are dropped, missing ones created,
    /// and surviving ones get their position, label, route and stroke
    /// refreshed. A node whose icon or tint changed is rasterized again.
    pub fn reconcile(&mut self, diagram: &Diagram, rasterizer: &mut dyn IconRasterizer) {
        let orphans: Vec<NodeId> = self
            .nodes
            .keys()
            .filter(|id| diagram.visible_node(id).is_none())
            .cloned()
            .collect();
        for id in orphans {
            self.latest.remove(&id);
            self.destroy_node(&id);
        }
        let orphans: Vec<ConnectorId> = self
            .connectors
            .keys()
            .filter(|id| !diagram.connector(**id).is_some_and(|c| c.is_visible()))
            .copied()
            .collect();
        for id in orphans {
            self.destroy_connector(id);
        }

        let missing: Vec<NodeId> = diagram
            .visible_nodes()
            .map(|n| n.id().clone())
            .filter(|id| !self.nodes.contains_key(id) && !self.latest.contains_key(id))
            .collect();
        for id in &missing {
            self.request_node(diagram, id, rasterizer);
        }
        let missing: Vec<ConnectorId> = diagram
            .visible_connectors()
            .map(|c| c.id())
            .filter(|id| !self.connectors.contains_key(id))
            .collect();
        for id in missing {
            self.create_connector(diagram, id);
        }

        let existing: Vec<NodeId> = self.nodes.keys().cloned().collect();
        for id in &existing {
            self.sync_node(diagram, id, rasterizer);
        }
        let existing: Vec<ConnectorId> = self.connectors.keys().copied().collect();
        for id in existing {
            self.patch_connector(diagram, id);
            if self.connectors.contains_key(&id) {
                self.recolor_connector(diagram, id);
            }
        }
        self.scene.batch_draw();
    }

    /// Complete a rasterization request.
    ///
    /// Returns whether the image was put on the stage. Results for
    /// superseded requests or deleted nodes are discarded.
    pub fn icon_ready(
        &mut self,
        diagram: &Diagram,
        ticket: RasterTicket,
        result: Result<ImageData, RenderError>,
    ) -> bool {
        let Some(request) = self.requests.remove(&ticket) else {
            log::debug!("unknown raster ticket {ticket}");
            return false;
        };
        if self.latest.get(&request.node) != Some(&ticket) {
            log::debug!("raster ticket {ticket} superseded for node {}", request.node);
            return false;
        }
        self.latest.remove(&request.node);

        let image = match result {
            Ok(image) => image,
            Err(err) => {
                log::warn!("icon for node {} unavailable: {err}", request.node);
                return false;
            }
        };
        self.image_cache
            .insert((request.icon.clone(), request.color), image.clone());

        if diagram.visible_node(&request.node).is_none() {
            log::debug!("node {} gone before its icon arrived", request.node);
            return false;
        }
        self.install_node(diagram, &request.node, &image, (request.icon, request.color));
        self.scene.batch_draw();
        true
    }

    /// Track the container's size.
    pub fn resize(&mut self, size: Size) {
        self.scene.resize(size);
        self.size = Some(size);
        self.scene.batch_draw();
    }

    /// Push the viewport's transform and size to the stage if they changed.
    pub fn sync_viewport(&mut self, viewport: &Viewport) -> bool {
        let mut changed = false;
        if self.size != Some(viewport.size) {
            self.scene.resize(viewport.size);
            self.size = Some(viewport.size);
            changed = true;
        }
        let transform = viewport.transform();
        if self.transform != Some(transform) {
            self.scene.set_transform(transform);
            self.transform = Some(transform);
            changed = true;
        }
        if changed {
            self.scene.batch_draw();
        }
        changed
    }

    /// Advance the dash animation to host time `now_ms`.
    pub fn frame(&mut self, now_ms: f64) {
        let elapsed = self.clock.sample(now_ms);
        if self.connectors.is_empty() || self.clock.is_paused() {
            return;
        }
        for visual in self.connectors.values() {
            let offset = dash_offset(
                elapsed - visual.started_ms,
                self.config.dash_speed_ms,
                self.config.dash_cycle,
            );
            self.scene.set_dash_offset(visual.arrow, offset);
        }
        self.scene.batch_draw();
    }

    pub fn pause_animation(&mut self) {
        self.clock.pause();
    }

    pub fn resume_animation(&mut self) {
        self.clock.resume();
    }

    pub fn is_animation_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Entity under a screen position.
    pub fn hit_test(&self, screen: Point) -> Option<HitTarget> {
        let primitive = self.scene.hit_test(screen)?;
        self.owners.get(&primitive).cloned()
    }

    /// Icon and label primitives of a node.
    pub fn node_primitives(&self, id: &NodeId) -> Option<(PrimitiveId, PrimitiveId)> {
        self.nodes.get(id).map(|v| (v.icon, v.label))
    }

    pub fn connector_primitive(&self, id: ConnectorId) -> Option<PrimitiveId> {
        self.connectors.get(&id).map(|v| v.arrow)
    }

    /// Number of entities with a visual.
    pub fn visual_count(&self) -> usize {
        self.nodes.len() + self.connectors.len()
    }

    /// Rasterizations still awaited.
    pub fn pending_rasterizations(&self) -> usize {
        self.latest.len()
    }

    fn request_node(
        &mut self,
        diagram: &Diagram,
        id: &NodeId,
        rasterizer: &mut dyn IconRasterizer,
    ) {
        let Some(node) = diagram.visible_node(id) else {
            return;
        };
        let key = (node.icon().clone(), node.color());
        if let Some(image) = self.image_cache.get(&key).cloned() {
            // A cached image makes any outstanding request obsolete.
            self.latest.remove(id);
            self.install_node(diagram, id, &image, key);
            return;
        }

        self.next_ticket += 1;
        let ticket = RasterTicket(self.next_ticket);
        self.requests.insert(
            ticket,
            RasterRequest {
                node: id.clone(),
                icon: key.0.clone(),
                color: key.1,
            },
        );
        self.latest.insert(id.clone(), ticket);
        log::debug!("raster ticket {ticket}: {} in {}", key.0, key.1);
        rasterizer.request(ticket, &key.0, key.1);
    }

    /// Replace a node's primitive pair with a fresh one.
    fn install_node(
        &mut self,
        diagram: &Diagram,
        id: &NodeId,
        image: &ImageData,
        key: (IconRef, HexColor),
    ) {
        let Some(node) = diagram.visible_node(id) else {
            return;
        };
        let anchor = node.position();
        let style = self.config.text_style();
        let icon = self.scene.create_image(image, icon_rect(anchor));
        let label = self
            .scene
            .create_text(node.name(), label_origin(anchor), &style);
        self.destroy_node(id);

        self.owners.insert(icon, HitTarget::NodeIcon(id.clone()));
        self.owners.insert(label, HitTarget::NodeLabel(id.clone()));
        self.nodes.insert(id.clone(), NodeVisual { icon, label, key });
    }

    fn move_node(&mut self, diagram: &Diagram, id: &NodeId) {
        let Some(node) = diagram.visible_node(id) else {
            return;
        };
        let anchor = node.position();
        if let Some(visual) = self.nodes.get(id) {
            self.scene.set_position(visual.icon, icon_rect(anchor).origin());
            self.scene.set_position(visual.label, label_origin(anchor));
        } else {
            log::debug!("node {id} moved without a visual");
        }
        let touching: Vec<ConnectorId> = diagram.connectors_touching(id).map(|c| c.id()).collect();
        for connector in touching {
            self.patch_connector(diagram, connector);
        }
    }

    /// Refresh an existing node visual from the model.
    fn sync_node(&mut self, diagram: &Diagram, id: &NodeId, rasterizer: &mut dyn IconRasterizer) {
        let (Some(node), Some(visual)) = (diagram.visible_node(id), self.nodes.get(id)) else {
            return;
        };
        let anchor = node.position();
        self.scene.set_position(visual.icon, icon_rect(anchor).origin());
        self.scene.set_position(visual.label, label_origin(anchor));
        self.scene.set_text(visual.label, node.name());

        let stale = visual.key.0 != *node.icon() || visual.key.1 != node.color();
        if stale && !self.latest.contains_key(id) {
            log::debug!("node {id} icon out of date");
            self.request_node(diagram, id, rasterizer);
        }
    }

    fn rename_node(&mut self, diagram: &Diagram, id: &NodeId) {
        let (Some(node), Some(visual)) = (diagram.visible_node(id), self.nodes.get(id)) else {
            log::debug!("node {id} renamed without a visual");
            return;
        };
        self.scene.set_text(visual.label, node.name());
    }

    fn destroy_node(&mut self, id: &NodeId) {
        if let Some(visual) = self.nodes.remove(id) {
            for primitive in [visual.icon, visual.label] {
                self.scene.destroy(primitive);
                self.owners.remove(&primitive);
            }
        }
    }

    fn create_connector(&mut self, diagram: &Diagram, id: ConnectorId) {
        let Some(connector) = diagram.connector(id).filter(|c| c.is_visible()) else {
            return;
        };
        if diagram.visible_node(connector.start()).is_none()
            || diagram.visible_node(connector.end()).is_none()
        {
            log::debug!("connector {id} has an unresolved endpoint");
            return;
        }
        let Some(points) = diagram.connector_path(id) else {
            return;
        };
        self.destroy_connector(id);

        let style = self.config.arrow_style(Color::from(connector.color()));
        let arrow = self.scene.create_arrow(&points, &style);
        self.scene.move_to_bottom(arrow);
        self.scene.set_dash_offset(arrow, 0.0);
        self.owners.insert(arrow, HitTarget::Connector(id));
        self.connectors.insert(
            id,
            ConnectorVisual {
                arrow,
                started_ms: self.clock.elapsed_ms(),
            },
        );
    }

    fn patch_connector(&mut self, diagram: &Diagram, id: ConnectorId) {
        let Some(arrow) = self.connectors.get(&id).map(|v| v.arrow) else {
            return;
        };
        let points = diagram
            .connector(id)
            .filter(|c| c.is_visible())
            .and_then(|_| diagram.connector_path(id));
        match points {
            Some(points) => self.scene.set_points(arrow, &points),
            None => {
                log::debug!("connector {id} lost an endpoint");
                self.destroy_connector(id);
            }
        }
    }

    fn recolor_connector(&mut self, diagram: &Diagram, id: ConnectorId) {
        let (Some(connector), Some(visual)) = (diagram.connector(id), self.connectors.get(&id))
        else {
            log::debug!("connector {id} recolored without a visual");
            return;
        };
        self.scene
            .set_stroke(visual.arrow, Color::from(connector.color()));
    }

    /// Removing the visual also ends its animation.
    fn destroy_connector(&mut self, id: ConnectorId) {
        if let Some(visual) = self.connectors.remove(&id) {
            self.scene.destroy(visual.arrow);
            self.owners.remove(&visual.arrow);
        }
    }

    fn clear(&mut self) {
        let nodes: Vec<NodeId> = self.nodes.keys().cloned().collect();
        for id in &nodes {
            self.destroy_node(id);
        }
        let connectors: Vec<ConnectorId> = self.connectors.keys().copied().collect();
        for id in connectors {
            self.destroy_connector(id);
        }
        // Outstanding tickets become stale.
        self.latest.clear();
    }
}
