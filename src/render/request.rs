//! Render request and response types

use std::sync::Arc;

use image::RgbaImage;

use crate::editor::zoom::Scale;

/// Unique identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Parameters for rendering a page
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderJob {
    /// Page number (1-based)
    pub page: usize,
    /// Requested scale; the fit marker is resolved by the worker
    pub scale: Scale,
    /// Width of the container the raster is displayed in, used for fit
    pub container_width: f32,
}

/// Request sent to the render worker
#[derive(Debug)]
pub enum RenderRequest {
    /// Render a page
    Page { id: RequestId, job: RenderJob },

    /// Shutdown the worker
    Shutdown,
}

/// Errors raised while opening a document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentOpenError {
    #[error("document is empty")]
    Empty,

    #[error("unreadable document: {detail}")]
    Unreadable { detail: String },

    #[error("document has no pages")]
    NoPages,

    #[error("render worker is not running")]
    WorkerUnavailable,
}

impl DocumentOpenError {
    pub fn unreadable(msg: impl Into<String>) -> Self {
        Self::Unreadable { detail: msg.into() }
    }
}

/// Errors raised while painting a single page
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("page {page} is outside 1..={page_count}")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("page {page}: {detail}")]
    Paint { page: usize, detail: String },

    #[error("render worker is not running")]
    WorkerUnavailable,
}

impl RenderError {
    pub fn paint(page: usize, msg: impl Into<String>) -> Self {
        Self::Paint {
            page,
            detail: msg.into(),
        }
    }
}

/// A fully painted page raster
#[derive(Clone)]
pub struct RenderedPage {
    /// Page number (1-based)
    pub page: usize,
    /// Numeric scale the raster was painted at
    pub scale: f32,
    /// Painted pixels
    pub raster: Arc<RgbaImage>,
}

impl std::fmt::Debug for RenderedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedPage")
            .field("page", &self.page)
            .field("scale", &self.scale)
            .field("width_px", &self.raster.width())
            .field("height_px", &self.raster.height())
            .finish()
    }
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    /// Document metadata (sent once after the worker opened the document)
    DocumentInfo { page_count: usize },

    /// The worker could not open the document and has exited
    OpenFailed(DocumentOpenError),

    /// Rendered page data
    Page { id: RequestId, page: RenderedPage },

    /// Error during rendering
    Error {
        id: RequestId,
        page: usize,
        error: RenderError,
    },
}
