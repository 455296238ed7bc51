//! Drag gesture state machine
//!
//! Pointer and touch events are reduced to three gestures: press, drag and
//! release. A press starts a drag at the mapped raster position, every drag
//! update produces a live preview rectangle, and a release either commits
//! the last preview or discards it when it is too small to be intentional.
//!
//! The machine does not draw or store anything itself. It returns an
//! [`Outcome`] telling the session what to do.

use super::geometry::{Point, Rect};

/// Gesture delivered to the interaction machine, already in raster space
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    /// Pointer down / touch start
    Press(Point),
    /// Pointer move / touch move
    Drag(Point),
    /// Pointer up, pointer leaving the surface, or touch end
    Release,
}

/// Current state of the gesture
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging {
        /// Where the drag started
        start: Point,
        /// Rectangle from the most recent drag update
        last_rect: Option<Rect>,
    },
}

/// What the session should do in response to a gesture
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// Nothing to do
    Ignored,
    /// A drag started; nothing is drawn yet
    Started,
    /// Redraw with this rectangle as a live overlay
    Preview(Rect),
    /// Store this rectangle for the current page and redraw
    Commit(Rect),
    /// Drop the transient overlay and redraw what is stored
    Discard,
}

/// Turns drag gestures into committed or discarded rectangles
#[derive(Debug)]
pub struct InteractionMachine {
    state: InteractionState,
    min_side: f32,
}

impl InteractionMachine {
    /// Rectangles with a side shorter than `min_side` pixels are discarded
    #[must_use]
    pub fn new(min_side: f32) -> Self {
        Self {
            state: InteractionState::Idle,
            min_side,
        }
    }

    #[must_use]
    pub fn state(&self) -> InteractionState {
        self.state
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging { .. })
    }

    /// Advance the state machine by one gesture
    pub fn handle(&mut self, gesture: Gesture) -> Outcome {
        match (gesture, self.state) {
            // A second press mid-drag restarts from the new point.
            (Gesture::Press(start), _) => {
                self.state = InteractionState::Dragging {
                    start,
                    last_rect: None,
                };
                Outcome::Started
            }

            (Gesture::Drag(_) | Gesture::Release, InteractionState::Idle) => Outcome::Ignored,

            (Gesture::Drag(point), InteractionState::Dragging { start, .. }) => {
                let rect = Rect::from_corners(start, point);
                self.state = InteractionState::Dragging {
                    start,
                    last_rect: Some(rect),
                };
                Outcome::Preview(rect)
            }

            (Gesture::Release, InteractionState::Dragging { last_rect, .. }) => {
                self.state = InteractionState::Idle;
                match last_rect {
                    Some(rect) if rect.meets_minimum(self.min_side) => Outcome::Commit(rect),
                    _ => Outcome::Discard,
                }
            }
        }
    }

    /// Abandon any drag in progress without producing an outcome
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> InteractionMachine {
        InteractionMachine::new(5.0)
    }

    #[test]
    fn drag_while_idle_is_ignored() {
        let mut m = machine();
        assert_eq!(m.handle(Gesture::Drag(Point::new(5.0, 5.0))), Outcome::Ignored);
        assert_eq!(m.state(), InteractionState::Idle);
    }

    #[test]
    fn release_while_idle_is_ignored() {
        let mut m = machine();
        assert_eq!(m.handle(Gesture::Release), Outcome::Ignored);
    }

    #[test]
    fn press_starts_drag_without_rect() {
        let mut m = machine();
        assert_eq!(m.handle(Gesture::Press(Point::new(1.0, 2.0))), Outcome::Started);
        assert_eq!(
            m.state(),
            InteractionState::Dragging {
                start: Point::new(1.0, 2.0),
                last_rect: None
            }
        );
    }

    #[test]
    fn drag_previews_normalized_rect() {
        let mut m = machine();
        m.handle(Gesture::Press(Point::new(300.0, 250.0)));

        let outcome = m.handle(Gesture::Drag(Point::new(100.0, 100.0)));
        assert_eq!(outcome, Outcome::Preview(Rect::new(100.0, 100.0, 200.0, 150.0)));
    }

    #[test]
    fn release_commits_last_preview() {
        let mut m = machine();
        m.handle(Gesture::Press(Point::new(100.0, 100.0)));
        m.handle(Gesture::Drag(Point::new(200.0, 200.0)));
        m.handle(Gesture::Drag(Point::new(300.0, 250.0)));

        assert_eq!(
            m.handle(Gesture::Release),
            Outcome::Commit(Rect::new(100.0, 100.0, 200.0, 150.0))
        );
        assert_eq!(m.state(), InteractionState::Idle);
    }

    #[test]
    fn release_without_move_discards() {
        let mut m = machine();
        m.handle(Gesture::Press(Point::new(100.0, 100.0)));
        assert_eq!(m.handle(Gesture::Release), Outcome::Discard);
        assert!(!m.is_dragging());
    }

    #[test]
    fn tiny_rect_is_discarded() {
        let mut m = machine();
        m.handle(Gesture::Press(Point::new(100.0, 100.0)));
        m.handle(Gesture::Drag(Point::new(103.0, 103.0)));
        assert_eq!(m.handle(Gesture::Release), Outcome::Discard);
    }

    #[test]
    fn thin_rect_is_discarded() {
        let mut m = machine();
        m.handle(Gesture::Press(Point::new(0.0, 0.0)));
        m.handle(Gesture::Drag(Point::new(400.0, 4.0)));
        assert_eq!(m.handle(Gesture::Release), Outcome::Discard);
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut m = machine();
        m.handle(Gesture::Press(Point::new(0.0, 0.0)));
        m.handle(Gesture::Drag(Point::new(5.0, 5.0)));
        assert_eq!(
            m.handle(Gesture::Release),
            Outcome::Commit(Rect::new(0.0, 0.0, 5.0, 5.0))
        );
    }

    #[test]
    fn second_press_restarts_drag() {
        let mut m = machine();
        m.handle(Gesture::Press(Point::new(0.0, 0.0)));
        m.handle(Gesture::Drag(Point::new(50.0, 50.0)));
        m.handle(Gesture::Press(Point::new(10.0, 10.0)));

        assert_eq!(
            m.state(),
            InteractionState::Dragging {
                start: Point::new(10.0, 10.0),
                last_rect: None
            }
        );
    }

    #[test]
    fn reset_abandons_drag() {
        let mut m = machine();
        m.handle(Gesture::Press(Point::new(0.0, 0.0)));
        m.reset();
        assert_eq!(m.handle(Gesture::Release), Outcome::Ignored);
    }
}
