//! Render service - owns the worker thread and its channels

use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info};

use super::backend::PageRenderer;
use super::request::{
    DocumentOpenError, RenderError, RenderJob, RenderRequest, RenderResponse, RequestId,
};
use super::worker::render_worker;

/// Document metadata
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocumentInfo {
    pub page_count: usize,
}

/// Runs page rendering on a dedicated worker thread
pub struct RenderService {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    doc_info: DocumentInfo,
}

impl RenderService {
    /// Spawn the worker and wait for it to open the document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentOpenError`] if the renderer rejects the bytes, the
    /// document has no pages, or the worker dies before reporting.
    pub fn start(
        renderer: Box<dyn PageRenderer>,
        bytes: Arc<[u8]>,
        cache_size: usize,
    ) -> Result<Self, DocumentOpenError> {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        std::thread::spawn(move || {
            render_worker(renderer, bytes, request_rx, response_tx, cache_size);
        });

        let doc_info = match response_rx.recv() {
            Ok(RenderResponse::DocumentInfo { page_count }) => DocumentInfo { page_count },
            Ok(RenderResponse::OpenFailed(e)) => return Err(e),
            Ok(other) => {
                return Err(DocumentOpenError::unreadable(format!(
                    "unexpected worker response: {other:?}"
                )));
            }
            Err(_) => return Err(DocumentOpenError::WorkerUnavailable),
        };

        info!("Document opened with {} pages", doc_info.page_count);

        Ok(Self {
            request_tx,
            response_rx,
            doc_info,
        })
    }

    /// Get document metadata
    #[must_use]
    pub fn document_info(&self) -> DocumentInfo {
        self.doc_info
    }

    /// Send a page render request to the worker.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::WorkerUnavailable`] if the worker has exited.
    pub fn submit(&self, id: RequestId, job: RenderJob) -> Result<(), RenderError> {
        debug!("Submitting render {id:?} for page {}", job.page);
        self.request_tx
            .send(RenderRequest::Page { id, job })
            .map_err(|_| RenderError::WorkerUnavailable)
    }

    /// Poll for completed render responses without blocking
    pub fn poll_responses(&self) -> Vec<RenderResponse> {
        self.response_rx.try_iter().collect()
    }

    /// Block until a response arrives or `timeout` elapses.
    ///
    /// Returns `Err(RenderError::WorkerUnavailable)` if the worker is gone.
    pub fn wait_response(&self, timeout: Duration) -> Result<Option<RenderResponse>, RenderError> {
        match self.response_rx.recv_timeout(timeout) {
            Ok(response) => Ok(Some(response)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(RenderError::WorkerUnavailable),
        }
    }

    /// Ask the worker to exit
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
