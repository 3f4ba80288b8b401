//! Editor session wiring input, controller, model and scene together.

use crate::adapter::RenderAdapter;
use crate::export::{EXPORT_FILE_NAME, ExportService};
use crate::icons::{IconRasterizer, RasterTicket};
use crate::scene::{RenderConfig, RenderError, RenderResult, SceneBackend};
use iconflow_core::{
    Diagram, GestureConfig, GestureRecognizer, InteractionController, PointerEvent, RawEvent,
    SemanticEvent, UiHost, Viewport, ViewportConfig,
};
use kurbo::{Point, Rect};
use peniko::ImageData;

/// Settings for one editor session.
#[derive(Debug, Clone, Default)]
pub struct EditorConfig {
    pub viewport: ViewportConfig,
    pub gestures: GestureConfig,
    pub render: RenderConfig,
}

impl EditorConfig {
    pub fn with_viewport(mut self, viewport: ViewportConfig) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_gestures(mut self, gestures: GestureConfig) -> Self {
        self.gestures = gestures;
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }
}

/// One diagram editing session.
///
/// Every call runs to completion and leaves the scene consistent with the
/// diagram, except for icons whose rasterization is still in flight.
pub struct Editor<S, R, U> {
    diagram: Diagram,
    viewport: Viewport,
    controller: InteractionController,
    gestures: GestureRecognizer,
    adapter: RenderAdapter<S>,
    rasterizer: R,
    ui: U,
}

impl<S, R, U> Editor<S, R, U>
where
    S: SceneBackend,
    R: IconRasterizer,
    U: UiHost,
{
    pub fn new(config: EditorConfig, scene: S, rasterizer: R, ui: U) -> Self {
        let mut editor = Self {
            diagram: Diagram::new(),
            viewport: Viewport::new(config.viewport),
            controller: InteractionController::new(),
            gestures: GestureRecognizer::new(config.gestures),
            adapter: RenderAdapter::new(scene, config.render),
            rasterizer,
            ui,
        };
        editor.flush();
        editor
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    /// Direct model access. Call [`Editor::flush`] afterwards.
    pub fn diagram_mut(&mut self) -> &mut Diagram {
        &mut self.diagram
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn adapter(&self) -> &RenderAdapter<S> {
        &self.adapter
    }

    pub fn scene(&self) -> &S {
        self.adapter.scene()
    }

    pub fn rasterizer_mut(&mut self) -> &mut R {
        &mut self.rasterizer
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    /// Feed one host event.
    pub fn handle(&mut self, event: RawEvent) {
        let target = match &event {
            RawEvent::Pointer(PointerEvent::Down { position, .. }) => {
                self.adapter.hit_test(*position)
            }
            _ => None,
        };
        for semantic in self.gestures.feed(&event, target) {
            self.dispatch(semantic);
        }
    }

    /// Feed one editor-level event, e.g. a menu choice or text commit.
    pub fn dispatch(&mut self, event: SemanticEvent) {
        log::trace!("dispatch {event:?}");
        self.controller
            .handle(event, &mut self.diagram, &mut self.viewport, &mut self.ui);
        self.flush();
    }

    /// Bring the stage in line with the viewport and the diagram.
    pub fn flush(&mut self) {
        self.adapter.sync_viewport(&self.viewport);
        self.adapter.apply(&mut self.diagram, &mut self.rasterizer);
    }

    /// Report the outcome of a rasterization request.
    pub fn icon_ready(&mut self, ticket: RasterTicket, result: Result<ImageData, RenderError>) {
        self.adapter.icon_ready(&self.diagram, ticket, result);
    }

    /// Advance the connector animation.
    pub fn frame(&mut self, now_ms: f64) {
        self.adapter.frame(now_ms);
    }

    pub fn set_animation_paused(&mut self, paused: bool) {
        if paused {
            self.adapter.pause_animation();
        } else {
            self.adapter.resume_animation();
        }
    }

    /// Rebuild every primitive from the diagram.
    pub fn redraw(&mut self) {
        self.adapter.sync_viewport(&self.viewport);
        self.adapter
            .redraw_diagram(&mut self.diagram, &mut self.rasterizer);
    }

    /// Repair the scene after the diagram was changed without [`Editor::flush`].
    pub fn reconcile(&mut self) {
        self.diagram.take_events();
        self.adapter.reconcile(&self.diagram, &mut self.rasterizer);
    }

    /// Start over with an empty diagram.
    pub fn new_diagram(&mut self) {
        self.controller.reset(&mut self.ui);
        self.diagram.reset();
        self.flush();
    }

    /// Save the visible stage as `diagram.png`.
    pub fn export(&mut self, service: &mut dyn ExportService) -> RenderResult<()> {
        let region = Rect::from_origin_size(Point::ZERO, self.viewport.size);
        match service.capture(region, EXPORT_FILE_NAME) {
            Ok(()) => {
                log::info!("exported {EXPORT_FILE_NAME}");
                Ok(())
            }
            Err(err) => {
                log::warn!("export failed: {err}");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryScene, Primitive};
    use crate::testing::{RecordingRasterizer, RecordingUi, image};
    use iconflow_core::{IconRef, InteractionState, MouseButton, NodeId, PALETTE};
    use kurbo::{Size, Vec2};

    type TestEditor = Editor<MemoryScene, RecordingRasterizer, RecordingUi>;

    fn editor() -> TestEditor {
        let _ = env_logger::builder().is_test(true).try_init();
        Editor::new(
            EditorConfig::default(),
            MemoryScene::new(),
            RecordingRasterizer::default(),
            RecordingUi::default(),
        )
    }

    fn drop_icon(editor: &mut TestEditor, x: f64, y: f64) -> NodeId {
        editor.handle(RawEvent::Drop {
            position: Point::new(x, y),
            icon: IconRef::from("icons/server.svg"),
        });
        for (ticket, _, _) in editor.rasterizer_mut().take() {
            editor.icon_ready(ticket, Ok(image()));
        }
        editor
            .diagram()
            .visible_nodes()
            .last()
            .map(|n| n.id().clone())
            .unwrap()
    }

    fn pointer(editor: &mut TestEditor, event: PointerEvent) {
        editor.handle(RawEvent::Pointer(event));
    }

    fn click(editor: &mut TestEditor, x: f64, y: f64, button: MouseButton, time_ms: f64) {
        let position = Point::new(x, y);
        pointer(
            editor,
            PointerEvent::Down {
                position,
                button,
                time_ms,
            },
        );
        pointer(editor, PointerEvent::Up { position, button });
    }

    fn double_click(editor: &mut TestEditor, x: f64, y: f64, time_ms: f64) {
        click(editor, x, y, MouseButton::Left, time_ms);
        click(editor, x, y, MouseButton::Left, time_ms + 150.0);
    }

    #[test]
    fn test_reconcile_picks_up_direct_model_edits() {
        let mut editor = editor();
        let n1 = drop_icon(&mut editor, 100.0, 100.0);
        let (icon, label) = editor.adapter().node_primitives(&n1).unwrap();

        editor.diagram_mut().rename_node(&n1, "Renamed").unwrap();
        editor
            .diagram_mut()
            .move_node(&n1, Point::new(400.0, 400.0))
            .unwrap();
        editor.reconcile();

        match editor.scene().primitive(label) {
            Some(Primitive::Text { text, .. }) => assert_eq!(text, "Renamed"),
            other => panic!("unexpected {other:?}"),
        }
        match editor.scene().primitive(icon) {
            Some(Primitive::Image { bounds, .. }) => {
                assert_eq!(bounds.origin(), Point::new(350.0, 400.0))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_connector_geometry_for_dropped_nodes() {
        let mut editor = editor();
        let n1 = drop_icon(&mut editor, 100.0, 100.0);
        let n2 = drop_icon(&mut editor, 300.0, 100.0);
        let c = editor
            .diagram_mut()
            .create_connector(&n1, &n2, PALETTE[0].color)
            .unwrap();
        editor.flush();

        let arrow = editor.adapter().connector_primitive(c).unwrap();
        match editor.scene().primitive(arrow) {
            Some(Primitive::Arrow { points, .. }) => {
                assert_eq!(points.first(), Some(&Point::new(150.0, 150.0)));
                assert_eq!(points.last(), Some(&Point::new(250.0, 150.0)));
                assert_eq!(points[1].x, 200.0);
                assert_eq!(points[2].x, 200.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_wheel_zoom_is_clamped() {
        let mut editor = editor();
        let scroll = |editor: &mut TestEditor| {
            pointer(
                editor,
                PointerEvent::Scroll {
                    position: Point::new(400.0, 300.0),
                    delta: Vec2::new(0.0, -100.0),
                },
            )
        };
        scroll(&mut editor);
        scroll(&mut editor);
        assert!((editor.viewport().scale - 1.21).abs() < 1e-9);
        assert_eq!(editor.scene().transform(), editor.viewport().transform());

        for _ in 0..20 {
            scroll(&mut editor);
        }
        assert_eq!(editor.viewport().scale, 2.0);
    }

    #[test]
    fn test_double_clicks_connect_two_nodes() {
        let mut editor = editor();
        drop_icon(&mut editor, 100.0, 100.0);
        drop_icon(&mut editor, 300.0, 100.0);

        double_click(&mut editor, 100.0, 150.0, 0.0);
        assert!(editor.controller().pending_endpoint().is_some());
        double_click(&mut editor, 300.0, 150.0, 1000.0);

        assert_eq!(editor.diagram().visible_connectors().count(), 1);
        assert_eq!(editor.controller().state(), &InteractionState::Idle);

        // Same node twice cancels.
        double_click(&mut editor, 100.0, 150.0, 2000.0);
        double_click(&mut editor, 100.0, 150.0, 3000.0);
        assert_eq!(editor.diagram().visible_connectors().count(), 1);
        assert!(editor.controller().pending_endpoint().is_none());
    }

    #[test]
    fn test_delete_from_context_menu() {
        let mut editor = editor();
        let n1 = drop_icon(&mut editor, 100.0, 100.0);
        let n2 = drop_icon(&mut editor, 300.0, 100.0);
        editor
            .diagram_mut()
            .create_connector(&n1, &n2, PALETTE[0].color)
            .unwrap();
        editor.flush();

        click(&mut editor, 100.0, 150.0, MouseButton::Right, 0.0);
        assert!(editor.ui().menu_open);
        let delete = editor.ui().menus[0]
            .actions
            .iter()
            .position(|a| a.destructive)
            .unwrap();
        editor.dispatch(SemanticEvent::MenuActionChosen(delete));

        assert!(!editor.ui().menu_open);
        let visible: Vec<_> = editor.diagram().visible_nodes().map(|n| n.id().clone()).collect();
        assert_eq!(visible, vec![n2.clone()]);
        assert_eq!(editor.diagram().visible_connectors().count(), 0);
        assert_eq!(editor.scene().len(), 2);
        assert!(editor.adapter().node_primitives(&n2).is_some());
    }

    #[test]
    fn test_drag_updates_connector_in_place() {
        let mut editor = editor();
        let n1 = drop_icon(&mut editor, 100.0, 100.0);
        let n2 = drop_icon(&mut editor, 300.0, 100.0);
        let c = editor
            .diagram_mut()
            .create_connector(&n1, &n2, PALETTE[0].color)
            .unwrap();
        editor.flush();
        let arrow = editor.adapter().connector_primitive(c).unwrap();
        let created = editor.scene().created_count();

        pointer(
            &mut editor,
            PointerEvent::Down {
                position: Point::new(100.0, 120.0),
                button: MouseButton::Left,
                time_ms: 0.0,
            },
        );
        for step in 1..=10 {
            let t = step as f64 / 10.0;
            pointer(
                &mut editor,
                PointerEvent::Move {
                    position: Point::new(100.0 + 50.0 * t, 120.0 + 30.0 * t),
                },
            );
        }
        pointer(
            &mut editor,
            PointerEvent::Up {
                position: Point::new(150.0, 150.0),
                button: MouseButton::Left,
            },
        );

        let node = editor.diagram().node(&n1).unwrap();
        assert!((node.position() - Point::new(150.0, 130.0)).hypot() < 1e-9);
        assert_eq!(editor.adapter().connector_primitive(c), Some(arrow));
        assert_eq!(editor.scene().created_count(), created);
        match editor.scene().primitive(arrow) {
            Some(Primitive::Arrow { points, .. }) => {
                let expected = editor.diagram().connector_path(c).unwrap();
                assert_eq!(points.as_slice(), expected.as_slice());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(editor.controller().state(), &InteractionState::Idle);
    }

    #[test]
    fn test_inline_rename_through_label() {
        let mut editor = editor();
        let n1 = drop_icon(&mut editor, 100.0, 100.0);

        double_click(&mut editor, 100.0, 215.0, 0.0);
        assert!(editor.ui().input_open);
        assert_eq!(editor.ui().inputs[0].initial, "Node 1");

        editor.dispatch(SemanticEvent::LabelEditCommitted("Database".into()));
        assert!(!editor.ui().input_open);
        let (_, label) = editor.adapter().node_primitives(&n1).unwrap();
        match editor.scene().primitive(label) {
            Some(Primitive::Text { text, .. }) => assert_eq!(text, "Database"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_new_diagram_clears_scene() {
        let mut editor = editor();
        let n1 = drop_icon(&mut editor, 100.0, 100.0);
        click(&mut editor, 100.0, 150.0, MouseButton::Right, 0.0);

        editor.new_diagram();

        assert!(editor.scene().is_empty());
        assert!(editor.diagram().is_empty());
        assert!(!editor.ui().menu_open);
        assert!(editor.adapter().node_primitives(&n1).is_none());

        // Ids keep counting.
        let next = drop_icon(&mut editor, 0.0, 0.0);
        assert_eq!(next.as_str(), "2");
    }

    #[test]
    fn test_resize_and_export_region() {
        struct Capture(Vec<(Rect, String)>);
        impl ExportService for Capture {
            fn capture(&mut self, region: Rect, file_name: &str) -> RenderResult<()> {
                self.0.push((region, file_name.to_string()));
                Ok(())
            }
        }

        let mut editor = editor();
        editor.handle(RawEvent::Resize(Size::new(1024.0, 768.0)));
        assert_eq!(editor.scene().size(), Size::new(1024.0, 768.0));

        let mut capture = Capture(Vec::new());
        editor.export(&mut capture).unwrap();
        assert_eq!(
            capture.0,
            vec![(Rect::new(0.0, 0.0, 1024.0, 768.0), "diagram.png".to_string())]
        );
    }

    #[test]
    fn test_export_failure_is_reported() {
        struct Failing;
        impl ExportService for Failing {
            fn capture(&mut self, _: Rect, _: &str) -> RenderResult<()> {
                Err(RenderError::Export("canvas tainted".into()))
            }
        }

        let mut editor = editor();
        assert_eq!(
            editor.export(&mut Failing),
            Err(RenderError::Export("canvas tainted".into()))
        );
    }
}
