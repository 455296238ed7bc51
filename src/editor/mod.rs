//! Interactive crop editor core

pub mod compositor;
pub mod coords;
pub mod crop_boxes;
pub mod geometry;
pub mod interaction;
pub mod scheduler;
pub mod session;
pub mod zoom;

pub use compositor::{Compositor, PageSnapshot, stroke_dashed_rect};
pub use coords::{ClientPoint, PointerInput, SurfaceLayout, clamp_to_raster, map_to_raster};
pub use crop_boxes::{CropBox, CropBoxStore, Selections};
pub use geometry::{Point, Rect};
pub use interaction::{Gesture, InteractionMachine, InteractionState, Outcome};
pub use scheduler::{Finished, RenderScheduler, RenderTicket};
pub use session::{EditorError, EditorSession, Navigation, PointerEvent};
pub use zoom::Scale;
