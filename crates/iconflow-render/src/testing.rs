//! Recording hosts for tests.

use crate::icons::{IconRasterizer, RasterTicket};
use iconflow_core::{ContextMenu, HexColor, IconRef, TextInputRequest, UiHost};
use peniko::{Blob, ImageAlphaType, ImageData, ImageFormat};
use std::sync::Arc;

/// A 2x2 opaque white image.
pub fn image() -> ImageData {
    ImageData {
        data: Blob::new(Arc::new(vec![255u8; 16])),
        format: ImageFormat::Rgba8,
        width: 2,
        height: 2,
        alpha_type: ImageAlphaType::Alpha,
    }
}

#[derive(Debug, Default)]
pub struct RecordingRasterizer {
    pub requests: Vec<(RasterTicket, IconRef, HexColor)>,
}

impl RecordingRasterizer {
    pub fn take(&mut self) -> Vec<(RasterTicket, IconRef, HexColor)> {
        std::mem::take(&mut self.requests)
    }
}

impl IconRasterizer for RecordingRasterizer {
    fn request(&mut self, ticket: RasterTicket, icon: &IconRef, color: HexColor) {
        self.requests.push((ticket, icon.clone(), color));
    }
}

#[derive(Debug, Default)]
pub struct RecordingUi {
    pub menus: Vec<ContextMenu>,
    pub menu_open: bool,
    pub inputs: Vec<TextInputRequest>,
    pub input_open: bool,
}

impl UiHost for RecordingUi {
    fn show_menu(&mut self, menu: &ContextMenu) {
        self.menus.push(menu.clone());
        self.menu_open = true;
    }

    fn close_menu(&mut self) {
        self.menu_open = false;
    }

    fn open_text_input(&mut self, request: &TextInputRequest) {
        self.inputs.push(request.clone());
        self.input_open = true;
    }

    fn close_text_input(&mut self) {
        self.input_open = false;
    }
}
