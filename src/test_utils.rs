pub mod test_helpers {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use flume::{Receiver, Sender};
    use image::{Rgba, RgbaImage};

    use crate::editor::coords::{ClientPoint, PointerInput};
    use crate::editor::interaction::Outcome;
    use crate::editor::session::{EditorSession, PointerEvent};
    use crate::render::{DocumentHandle, DocumentOpenError, PageHandle, PageRenderer, RenderError};

    /// Pages painted so far, in paint order
    pub type PaintLog = Arc<Mutex<Vec<usize>>>;

    /// In-memory renderer with scripted page sizes and failures.
    ///
    /// Every page is a solid fill whose color depends on the page number, so
    /// tests can tell pages apart by looking at a pixel.
    #[derive(Clone)]
    pub struct ScriptedRenderer {
        pages: Vec<(f32, f32)>,
        failing: HashSet<usize>,
        gate: Option<Receiver<()>>,
        painted: PaintLog,
        unreadable: bool,
    }

    impl ScriptedRenderer {
        /// `page_count` pages of the same intrinsic size
        pub fn new(page_count: usize, size: (f32, f32)) -> Self {
            Self::with_pages(vec![size; page_count])
        }

        pub fn with_pages(pages: Vec<(f32, f32)>) -> Self {
            Self {
                pages,
                failing: HashSet::new(),
                gate: None,
                painted: Arc::new(Mutex::new(Vec::new())),
                unreadable: false,
            }
        }

        /// Make painting `page` fail
        pub fn failing_page(mut self, page: usize) -> Self {
            self.failing.insert(page);
            self
        }

        /// Reject every document as corrupt
        pub fn unreadable(mut self) -> Self {
            self.unreadable = true;
            self
        }

        /// Hold every paint until a token is sent on the returned sender.
        ///
        /// Dropping the sender releases all waiting and future paints.
        pub fn gated(mut self) -> (Self, Sender<()>) {
            let (tx, rx) = flume::unbounded();
            self.gate = Some(rx);
            (self, tx)
        }

        /// Shared handle to the paint log
        pub fn paint_log(&self) -> PaintLog {
            Arc::clone(&self.painted)
        }
    }

    /// Fill color used for `page`
    pub fn page_color(page: usize) -> Rgba<u8> {
        let shade = 255u8.saturating_sub((page as u8).wrapping_mul(20));
        Rgba([shade, 255, 255, 255])
    }

    impl PageRenderer for ScriptedRenderer {
        fn open(&self, _bytes: &[u8]) -> Result<Box<dyn DocumentHandle>, DocumentOpenError> {
            if self.unreadable {
                return Err(DocumentOpenError::unreadable("scripted corrupt document"));
            }
            Ok(Box::new(self.clone()))
        }
    }

    impl DocumentHandle for ScriptedRenderer {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page(&self, number: usize) -> Result<Box<dyn PageHandle + '_>, RenderError> {
            let size = number
                .checked_sub(1)
                .and_then(|i| self.pages.get(i))
                .copied()
                .ok_or(RenderError::PageOutOfRange {
                    page: number,
                    page_count: self.pages.len(),
                })?;
            Ok(Box::new(ScriptedPage {
                doc: self,
                number,
                size,
            }))
        }
    }

    struct ScriptedPage<'a> {
        doc: &'a ScriptedRenderer,
        number: usize,
        size: (f32, f32),
    }

    impl PageHandle for ScriptedPage<'_> {
        fn intrinsic_size(&self) -> (f32, f32) {
            self.size
        }

        fn paint(&self, surface: &mut RgbaImage, _scale: f32) -> Result<(), RenderError> {
            if let Some(gate) = &self.doc.gate {
                let _ = gate.recv();
            }
            self.doc.painted.lock().unwrap().push(self.number);

            if self.doc.failing.contains(&self.number) {
                return Err(RenderError::paint(self.number, "scripted failure"));
            }
            let color = page_color(self.number);
            for pixel in surface.pixels_mut() {
                *pixel = color;
            }
            Ok(())
        }
    }

    /// Builder for pointer drag sequences
    pub struct DragBuilder {
        events: Vec<PointerEvent>,
        touch: bool,
    }

    impl DragBuilder {
        /// Mouse press at `(x, y)` in client coordinates
        pub fn mouse(x: f32, y: f32) -> Self {
            Self {
                events: vec![PointerEvent::Down(PointerInput::Mouse(ClientPoint::new(x, y)))],
                touch: false,
            }
        }

        /// Single-finger touch start at `(x, y)`
        pub fn touch(x: f32, y: f32) -> Self {
            Self {
                events: vec![PointerEvent::Down(PointerInput::Touch(vec![
                    ClientPoint::new(x, y),
                ]))],
                touch: true,
            }
        }

        pub fn move_to(mut self, x: f32, y: f32) -> Self {
            let point = ClientPoint::new(x, y);
            let input = if self.touch {
                PointerInput::Touch(vec![point])
            } else {
                PointerInput::Mouse(point)
            };
            self.events.push(PointerEvent::Move(input));
            self
        }

        pub fn up(self) -> Vec<PointerEvent> {
            self.finish(PointerEvent::Up)
        }

        pub fn leave(self) -> Vec<PointerEvent> {
            self.finish(PointerEvent::Leave)
        }

        pub fn touch_end(self) -> Vec<PointerEvent> {
            self.finish(PointerEvent::TouchEnd)
        }

        /// Events so far, without a release
        pub fn build(self) -> Vec<PointerEvent> {
            self.events
        }

        fn finish(mut self, end: PointerEvent) -> Vec<PointerEvent> {
            self.events.push(end);
            self.events
        }
    }

    /// Feed `events` to the session, returning each outcome
    pub fn replay(session: &mut EditorSession, events: Vec<PointerEvent>) -> Vec<Outcome> {
        events
            .into_iter()
            .map(|event| session.handle_pointer(event))
            .collect()
    }
}
