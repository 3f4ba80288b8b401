//! Stage snapshots.

use crate::scene::RenderResult;
use kurbo::Rect;

/// File name offered for downloaded snapshots.
pub const EXPORT_FILE_NAME: &str = "diagram.png";

/// Host service that captures a screen region as a PNG.
pub trait ExportService {
    fn capture(&mut self, region: Rect, file_name: &str) -> RenderResult<()>;
}
