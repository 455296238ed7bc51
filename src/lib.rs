pub mod editor;
pub mod notification;
pub mod render;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use editor::{CropBox, EditorError, EditorSession, PointerEvent, Rect, Scale, Selections};
pub use render::{DocumentOpenError, PageRenderer, RenderError};
pub use settings::EditorConfig;
