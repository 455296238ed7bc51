//! Page rendering infrastructure

mod backend;
mod cache;
#[cfg(feature = "pdf")]
mod mupdf_backend;
mod request;
mod service;
mod worker;

pub use backend::{DocumentHandle, PageHandle, PageRenderer, surface_dimensions};
pub use cache::{CacheKey, RasterCache};
#[cfg(feature = "pdf")]
pub use mupdf_backend::MupdfRenderer;
pub use request::{
    DocumentOpenError, RenderError, RenderJob, RenderRequest, RenderResponse, RenderedPage,
    RequestId,
};
pub use service::{DocumentInfo, RenderService};
pub use worker::render_page;

/// Default number of painted rasters kept by the worker
pub const DEFAULT_CACHE_SIZE: usize = 8;
