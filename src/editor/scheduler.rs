//! Single-flight page render scheduling
//!
//! At most one page render is in flight. Requests that arrive while busy are
//! parked in a one-slot pending buffer; each new request overwrites the
//! previous one, so a burst of navigation collapses into a single trailing
//! render of the last page asked for.

use log::debug;

use crate::render::RequestId;

/// A render that has been admitted and must be dispatched by the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTicket {
    pub id: RequestId,
    pub page: usize,
}

/// Scheduler state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SchedulerState {
    #[default]
    Idle,
    Rendering {
        ticket: RenderTicket,
        /// Most recent page requested while busy
        pending: Option<usize>,
    },
}

/// Result of reporting a render as finished
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finished {
    /// The id did not match the render in flight
    Stale,
    /// The in-flight render is done; `next` was started from the pending slot
    Done {
        finished: RenderTicket,
        next: Option<RenderTicket>,
    },
}

/// Serializes page renders one at a time
#[derive(Debug)]
pub struct RenderScheduler {
    state: SchedulerState,
    next_request_id: u64,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self {
            state: SchedulerState::Idle,
            next_request_id: 1,
        }
    }
}

impl RenderScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_rendering(&self) -> bool {
        matches!(self.state, SchedulerState::Rendering { .. })
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<RenderTicket> {
        match self.state {
            SchedulerState::Idle => None,
            SchedulerState::Rendering { ticket, .. } => Some(ticket),
        }
    }

    #[must_use]
    pub fn pending(&self) -> Option<usize> {
        match self.state {
            SchedulerState::Idle => None,
            SchedulerState::Rendering { pending, .. } => pending,
        }
    }

    /// Ask for `page` to be rendered.
    ///
    /// Returns a ticket when the render starts now. While busy the page
    /// replaces whatever was pending and `None` is returned.
    pub fn request(&mut self, page: usize) -> Option<RenderTicket> {
        if let SchedulerState::Rendering { ticket, pending } = &mut self.state {
            if let Some(previous) = pending.replace(page) {
                debug!("Pending page {previous} superseded by page {page}");
            } else {
                debug!("Page {page} deferred behind page {}", ticket.page);
            }
            return None;
        }
        Some(self.start(page))
    }

    /// Report the render `id` as finished, successfully or not.
    ///
    /// The scheduler is always left serviceable: it either goes idle or
    /// starts the pending page.
    pub fn finish(&mut self, id: RequestId) -> Finished {
        let SchedulerState::Rendering { ticket, pending } = self.state else {
            return Finished::Stale;
        };
        if ticket.id != id {
            return Finished::Stale;
        }

        self.state = SchedulerState::Idle;
        let next = pending.map(|page| self.start(page));
        Finished::Done {
            finished: ticket,
            next,
        }
    }

    fn start(&mut self, page: usize) -> RenderTicket {
        let ticket = RenderTicket {
            id: RequestId::new(self.next_request_id),
            page,
        };
        self.next_request_id += 1;
        self.state = SchedulerState::Rendering {
            ticket,
            pending: None,
        };
        ticket
    }
}
