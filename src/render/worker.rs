//! Render worker - runs in a dedicated thread

use std::sync::Arc;

use flume::{Receiver, Sender};
use image::RgbaImage;
use log::{debug, warn};

use super::backend::{DocumentHandle, PageRenderer, surface_dimensions};
use super::cache::{CacheKey, RasterCache};
use super::request::{
    DocumentOpenError, RenderError, RenderJob, RenderRequest, RenderResponse, RenderedPage,
    RequestId,
};
use crate::editor::zoom;

/// Main worker function - opens the document, then serves page requests
/// until shutdown or until every request sender is dropped.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker(
    renderer: Box<dyn PageRenderer>,
    bytes: Arc<[u8]>,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
    cache_size: usize,
) {
    let doc = match open_document(renderer.as_ref(), &bytes) {
        Ok(doc) => doc,
        Err(e) => {
            let _ = responses.send(RenderResponse::OpenFailed(e));
            return;
        }
    };

    let _ = responses.send(RenderResponse::DocumentInfo {
        page_count: doc.page_count(),
    });

    let mut cache = RasterCache::new(cache_size);

    for request in requests {
        match request {
            RenderRequest::Page { id, job } => {
                handle_page_request(doc.as_ref(), id, job, &mut cache, &responses);
            }

            RenderRequest::Shutdown => break,
        }
    }

    debug!("Render worker exiting");
}

fn open_document(
    renderer: &dyn PageRenderer,
    bytes: &[u8],
) -> Result<Box<dyn DocumentHandle>, DocumentOpenError> {
    if bytes.is_empty() {
        return Err(DocumentOpenError::Empty);
    }

    let doc = renderer.open(bytes)?;
    if doc.page_count() == 0 {
        return Err(DocumentOpenError::NoPages);
    }
    Ok(doc)
}

fn handle_page_request(
    doc: &dyn DocumentHandle,
    id: RequestId,
    job: RenderJob,
    cache: &mut RasterCache,
    responses: &Sender<RenderResponse>,
) {
    let response = match render_page(doc, job, cache) {
        Ok(page) => RenderResponse::Page { id, page },
        Err(error) => {
            warn!("Render of page {} failed: {error}", job.page);
            RenderResponse::Error {
                id,
                page: job.page,
                error,
            }
        }
    };
    let _ = responses.send(response);
}

/// Render a single page, serving it from the cache when possible
pub fn render_page(
    doc: &dyn DocumentHandle,
    job: RenderJob,
    cache: &mut RasterCache,
) -> Result<RenderedPage, RenderError> {
    let page_count = doc.page_count();
    if job.page == 0 || job.page > page_count {
        return Err(RenderError::PageOutOfRange {
            page: job.page,
            page_count,
        });
    }

    let page = doc.page(job.page)?;
    let intrinsic = page.intrinsic_size();
    let scale = zoom::resolve(job.scale, job.container_width, intrinsic.0);

    let key = CacheKey::new(job.page, scale);
    if let Some(raster) = cache.get(&key) {
        debug!("Page {} at scale {scale:.3} served from cache", job.page);
        return Ok(RenderedPage {
            page: job.page,
            scale,
            raster,
        });
    }

    let (width, height) = surface_dimensions(intrinsic, scale);
    let mut surface = RgbaImage::new(width, height);
    page.paint(&mut surface, scale)?;

    debug!(
        "Painted page {} at scale {scale:.3} ({width}x{height})",
        job.page
    );

    Ok(RenderedPage {
        page: job.page,
        scale,
        raster: cache.insert(key, surface),
    })
}
