//! Editor session - one open document and everything the crop editor knows about it
//!
//! The session is the only owner of the raster surface, the crop box store and
//! the render scheduler. Navigation and zoom go through the scheduler, render
//! completions arrive from the worker thread as messages and are applied on the
//! caller's thread by [`EditorSession::poll_renders`] or one of the waiting
//! variants.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use log::{debug, error, info, warn};

use super::compositor::Compositor;
use super::coords::{PointerInput, SurfaceLayout, clamp_to_raster, map_to_raster};
use super::crop_boxes::{CropBox, CropBoxStore, Selections};
use super::geometry::Point;
use super::interaction::{Gesture, InteractionMachine, Outcome};
use super::scheduler::{Finished, RenderScheduler, RenderTicket};
use super::zoom::{self, Scale};
use crate::notification::NotificationManager;
use crate::render::{
    DocumentOpenError, PageRenderer, RenderError, RenderJob, RenderResponse, RenderService,
    RenderedPage, RequestId,
};
use crate::settings::EditorConfig;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("could not open document: {0}")]
    Open(#[from] DocumentOpenError),

    #[error("no crop regions selected")]
    EmptySelection,
}

/// Pointer or touch event delivered by the host
#[derive(Clone, Debug, PartialEq)]
pub enum PointerEvent {
    Down(PointerInput),
    Move(PointerInput),
    Up,
    /// Pointer left the surface; finishes a drag like a release
    Leave,
    TouchEnd,
}

/// Whether the previous/next page affordances should be enabled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Navigation {
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

impl Navigation {
    #[must_use]
    pub fn at(page: usize, page_count: usize) -> Self {
        Self {
            can_go_back: page > 1,
            can_go_forward: page < page_count,
        }
    }
}

/// Scale a dispatched job was sent with, and the zoom generation at the time
#[derive(Clone, Copy, Debug)]
struct SentJob {
    id: RequestId,
    scale: Scale,
    zoom_generation: u64,
}

pub struct EditorSession {
    service: RenderService,
    page_count: usize,
    /// 1-based page of the most recently started render
    current_page: usize,
    scale: Scale,
    /// Bumped on every zoom change
    zoom_generation: u64,
    sent: Option<SentJob>,
    /// Page whose raster is currently on the surface
    displayed_page: Option<usize>,
    /// Numeric scale of the raster currently on the surface
    resolved_scale: Option<f32>,
    container_width: f32,
    layout: Option<SurfaceLayout>,
    navigation: Navigation,
    scheduler: RenderScheduler,
    compositor: Compositor,
    interaction: InteractionMachine,
    crop_boxes: CropBoxStore,
    notifications: NotificationManager,
    config: EditorConfig,
}

impl EditorSession {
    /// Open `bytes` with `renderer` and queue the first page.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Open`] if the document cannot be opened or has
    /// no pages. No session state survives a failed open.
    pub fn open(
        renderer: impl PageRenderer,
        bytes: impl Into<Arc<[u8]>>,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let service = RenderService::start(Box::new(renderer), bytes.into(), config.cache_size)?;
        let page_count = service.document_info().page_count;

        let mut session = Self {
            service,
            page_count,
            current_page: 1,
            scale: config.initial_scale(),
            zoom_generation: 0,
            sent: None,
            displayed_page: None,
            resolved_scale: None,
            container_width: 0.0,
            layout: None,
            navigation: Navigation::at(1, page_count),
            scheduler: RenderScheduler::new(),
            compositor: Compositor::new(config.selection_stroke),
            interaction: InteractionMachine::new(config.min_selection_px),
            crop_boxes: CropBoxStore::new(),
            notifications: NotificationManager::with_default_duration(Duration::from_secs(
                config.notification_secs,
            )),
            config,
        };

        info!("Editor session opened ({page_count} pages)");
        session.request_render(1);
        Ok(session)
    }

    // Navigation

    /// Render page `page`, clamped into the document's page range
    pub fn go_to_page(&mut self, page: usize) {
        let clamped = page.clamp(1, self.page_count);
        if clamped != page {
            debug!("Page {page} clamped to {clamped}");
        }
        self.request_render(clamped);
    }

    /// Step forward from the most recently requested page; no-op on the last page
    pub fn next_page(&mut self) {
        let target = self.target_page();
        if target < self.page_count {
            self.request_render(target + 1);
        }
    }

    /// Step back from the most recently requested page; no-op on the first page
    pub fn previous_page(&mut self) {
        let target = self.target_page();
        if target > 1 {
            self.request_render(target - 1);
        }
    }

    #[must_use]
    pub fn navigation(&self) -> Navigation {
        self.navigation
    }

    // Zoom

    /// Change the scale and re-render the target page at it
    pub fn set_zoom(&mut self, scale: Scale) {
        self.scale = match scale {
            Scale::Factor(f) if !f.is_finite() || f < self.config.min_scale => {
                debug!("Zoom {f} clamped to {}", self.config.min_scale);
                Scale::Factor(self.config.min_scale)
            }
            other => other,
        };
        self.zoom_generation += 1;
        debug!("Zoom set to {:?}", self.scale);
        self.request_render(self.target_page());
    }

    pub fn zoom_in(&mut self) {
        let factor = zoom::zoom_in(self.current_factor(), self.config.zoom_step);
        self.set_zoom(Scale::Factor(factor));
    }

    /// Zoom out one step; does nothing once the minimum scale is reached
    pub fn zoom_out(&mut self) {
        match zoom::zoom_out(
            self.current_factor(),
            self.config.zoom_step,
            self.config.min_scale,
        ) {
            Some(factor) => self.set_zoom(Scale::Factor(factor)),
            None => debug!("Already at minimum zoom"),
        }
    }

    pub fn fit_to_width(&mut self) {
        self.set_zoom(Scale::Fit);
    }

    /// Width of the container the page is displayed in; used by fit
    pub fn set_container_width(&mut self, width: f32) {
        self.container_width = width;
    }

    /// Displayed bounding box of the raster surface in client coordinates
    pub fn set_surface_layout(&mut self, layout: SurfaceLayout) {
        self.layout = Some(layout);
    }

    // Pointer input

    /// Feed one pointer or touch event through the drag state machine
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Outcome {
        let gesture = match event {
            PointerEvent::Down(input) => match self.map_input(&input) {
                Some(point) => Gesture::Press(point),
                None => return Outcome::Ignored,
            },
            PointerEvent::Move(input) => match self.map_input(&input) {
                Some(point) => Gesture::Drag(point),
                None => return Outcome::Ignored,
            },
            PointerEvent::Up | PointerEvent::Leave | PointerEvent::TouchEnd => Gesture::Release,
        };

        let outcome = self.interaction.handle(gesture);
        let page_index = self.current_page_index();
        match outcome {
            Outcome::Ignored | Outcome::Started => {}
            Outcome::Preview(rect) => {
                let stored = self.crop_boxes.get(page_index).map(|b| b.rect);
                self.compositor.redraw_with_live_rect(stored.as_ref(), &rect);
            }
            Outcome::Commit(rect) => {
                let scale = self.resolved_scale.unwrap_or_else(|| self.current_factor());
                if self
                    .crop_boxes
                    .set(page_index, CropBox::new(rect, scale))
                    .is_some()
                {
                    debug!("Replaced crop box on page {}", self.current_page);
                }
                self.redraw_current();
            }
            Outcome::Discard => {
                debug!("Selection discarded");
                self.redraw_current();
            }
        }
        outcome
    }

    // Selections

    pub fn clear_current_page_selection(&mut self) {
        self.crop_boxes.clear(self.current_page_index());
        self.redraw_current();
    }

    pub fn clear_all_selections(&mut self) {
        self.crop_boxes.clear_all();
        self.redraw_current();
    }

    /// Copy of every committed crop box keyed by zero-based page index
    #[must_use]
    pub fn selections(&self) -> Selections {
        self.crop_boxes.snapshot()
    }

    /// Selections for a downstream crop step, which needs at least one.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::EmptySelection`] and raises a warning
    /// notification when nothing has been committed.
    pub fn require_selections(&mut self) -> Result<Selections, EditorError> {
        if self.crop_boxes.is_empty() {
            self.notifications.warn("Select a crop region on at least one page.");
            return Err(EditorError::EmptySelection);
        }
        Ok(self.crop_boxes.snapshot())
    }

    #[must_use]
    pub fn crop_box(&self, page_index: usize) -> Option<&CropBox> {
        self.crop_boxes.get(page_index)
    }

    // Render completion

    /// Apply every render response that is ready and expire old
    /// notifications; returns how many responses were applied
    pub fn poll_renders(&mut self) -> usize {
        self.notifications.update();
        let responses = self.service.poll_responses();
        let count = responses.len();
        for response in responses {
            self.apply_response(response);
        }
        count
    }

    /// Block for at most `timeout` until one render response is applied.
    ///
    /// Returns false if nothing is rendering or the timeout elapsed.
    pub fn wait_for_render(&mut self, timeout: Duration) -> bool {
        self.notifications.update();
        if !self.scheduler.is_rendering() {
            return false;
        }
        match self.service.wait_response(timeout) {
            Ok(Some(response)) => {
                self.apply_response(response);
                true
            }
            Ok(None) => false,
            Err(error) => {
                if let Some(ticket) = self.scheduler.in_flight() {
                    self.complete(ticket.id, Err(error));
                }
                true
            }
        }
    }

    /// Apply responses until no render is in flight or pending.
    ///
    /// Returns false if `timeout` elapsed first.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.scheduler.is_rendering() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            self.wait_for_render(remaining);
        }
        true
    }

    // Queries

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    #[must_use]
    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Numeric scale of the raster on the surface, once one has been painted
    #[must_use]
    pub fn resolved_scale(&self) -> Option<f32> {
        self.resolved_scale
    }

    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.scheduler.is_rendering()
    }

    #[must_use]
    pub fn pending_page(&self) -> Option<usize> {
        self.scheduler.pending()
    }

    #[must_use]
    pub fn surface(&self) -> &RgbaImage {
        self.compositor.surface()
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn target_page(&self) -> usize {
        self.scheduler.pending().unwrap_or(self.current_page)
    }

    fn current_page_index(&self) -> usize {
        self.current_page - 1
    }

    fn current_factor(&self) -> f32 {
        match self.scale {
            Scale::Factor(f) => f,
            Scale::Fit => self.resolved_scale.unwrap_or(1.0),
        }
    }

    fn map_input(&self, input: &PointerInput) -> Option<Point> {
        let pixel_size = self.compositor.pixel_size();
        if pixel_size.0 == 0 || pixel_size.1 == 0 {
            debug!("Pointer event before any page was painted");
            return None;
        }
        let layout = self
            .layout
            .unwrap_or_else(|| SurfaceLayout::native(pixel_size));
        let Some(point) = map_to_raster(&layout, pixel_size, input) else {
            debug!("Pointer event without a usable contact point");
            return None;
        };
        Some(clamp_to_raster(point, pixel_size))
    }

    fn redraw_current(&mut self) {
        let stored = self.crop_boxes.get(self.current_page_index()).map(|b| b.rect);
        self.compositor.redraw(stored.as_ref());
    }

    fn request_render(&mut self, page: usize) {
        if let Some(ticket) = self.scheduler.request(page) {
            self.dispatch(ticket);
        }
    }

    fn dispatch(&mut self, ticket: RenderTicket) {
        self.current_page = ticket.page;
        let job = RenderJob {
            page: ticket.page,
            scale: self.scale,
            container_width: self.container_width,
        };
        self.sent = Some(SentJob {
            id: ticket.id,
            scale: job.scale,
            zoom_generation: self.zoom_generation,
        });
        if let Err(error) = self.service.submit(ticket.id, job) {
            self.complete(ticket.id, Err(error));
        }
    }

    fn apply_response(&mut self, response: RenderResponse) {
        match response {
            RenderResponse::Page { id, page } => self.complete(id, Ok(page)),
            RenderResponse::Error { id, error, .. } => self.complete(id, Err(error)),
            RenderResponse::DocumentInfo { .. } | RenderResponse::OpenFailed(_) => {
                warn!("Unexpected worker response after open: {response:?}");
            }
        }
    }

    fn complete(&mut self, id: RequestId, result: Result<RenderedPage, RenderError>) {
        let (finished, next) = match self.scheduler.finish(id) {
            Finished::Stale => {
                warn!("Ignoring stale render response {id:?}");
                return;
            }
            Finished::Done { finished, next } => (finished, next),
        };

        let sent = self.sent.take().filter(|job| job.id == finished.id);
        match result {
            Ok(page) => self.show(page, sent),
            Err(e) => {
                error!("Could not display page {}: {e}", finished.page);
                self.notifications
                    .error(format!("Could not display page {}.", finished.page));
            }
        }
        self.navigation = Navigation::at(finished.page, self.page_count);

        if let Some(ticket) = next {
            self.dispatch(ticket);
        }
    }

    fn show(&mut self, page: RenderedPage, sent: Option<SentJob>) {
        if self.displayed_page != Some(page.page) && self.interaction.is_dragging() {
            debug!("Drag abandoned, page {} replaced the surface", page.page);
            self.interaction.reset();
        }
        self.displayed_page = Some(page.page);

        self.compositor.present(&page.raster);
        self.compositor.capture_snapshot();
        self.resolved_scale = Some(page.scale);
        // Fit is consumed only by the render that was asked for it, and only
        // if the zoom has not changed since.
        let generation = self.zoom_generation;
        if sent.is_some_and(|job| job.scale.is_fit() && job.zoom_generation == generation) {
            debug!("Fit resolved to {:.3}", page.scale);
            self.scale = Scale::Factor(page.scale);
        }
        let stored = self.crop_boxes.get(page.page - 1).map(|b| b.rect);
        self.compositor.redraw(stored.as_ref());
        debug!("Displayed page {} at scale {:.3}", page.page, page.scale);
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        info!("Editor session closed");
    }
}
