//! Pointer position to raster pixel mapping
//!
//! The raster surface is usually displayed at a different size than its
//! internal pixel resolution (CSS scaling, device pixel ratio). Pointer
//! positions arrive in client space and have to be rescaled into the
//! raster's own coordinate system before they can be compared with painted
//! content or stored crop boxes.

use super::geometry::Point;

/// A pointer contact in client (CSS pixel) coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClientPoint {
    pub x: f32,
    pub y: f32,
}

impl ClientPoint {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Displayed bounding box of the raster surface in client coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceLayout {
    pub left: f32,
    pub top: f32,
    pub css_width: f32,
    pub css_height: f32,
}

impl SurfaceLayout {
    #[must_use]
    pub const fn new(left: f32, top: f32, css_width: f32, css_height: f32) -> Self {
        Self {
            left,
            top,
            css_width,
            css_height,
        }
    }

    /// A layout at the origin displaying the raster at its native size
    #[must_use]
    pub fn native(pixel_size: (u32, u32)) -> Self {
        Self::new(0.0, 0.0, pixel_size.0 as f32, pixel_size.1 as f32)
    }

    /// False while the surface is hidden or not laid out yet
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.css_width > 0.0 && self.css_height > 0.0
    }
}

/// Pointer input from either a mouse or a touch screen
#[derive(Clone, Debug, PartialEq)]
pub enum PointerInput {
    Mouse(ClientPoint),
    /// Active touch contacts; only the first one is used
    Touch(Vec<ClientPoint>),
}

impl PointerInput {
    /// The contact that drives the gesture
    #[must_use]
    pub fn primary(&self) -> Option<ClientPoint> {
        match self {
            Self::Mouse(p) => Some(*p),
            Self::Touch(contacts) => contacts.first().copied(),
        }
    }
}

/// Map a pointer input into raster pixel coordinates.
///
/// Returns `None` when there is no contact point or the surface has no
/// displayed area.
#[must_use]
pub fn map_to_raster(
    layout: &SurfaceLayout,
    pixel_size: (u32, u32),
    input: &PointerInput,
) -> Option<Point> {
    if !layout.is_visible() {
        return None;
    }
    let contact = input.primary()?;

    let scale_x = pixel_size.0 as f32 / layout.css_width;
    let scale_y = pixel_size.1 as f32 / layout.css_height;
    Some(Point::new(
        (contact.x - layout.left) * scale_x,
        (contact.y - layout.top) * scale_y,
    ))
}

/// Clamp a raster point into the painted area `[0, width] x [0, height]`
#[must_use]
pub fn clamp_to_raster(point: Point, pixel_size: (u32, u32)) -> Point {
    Point::new(
        point.x.clamp(0.0, pixel_size.0 as f32),
        point.y.clamp(0.0, pixel_size.1 as f32),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_css_space_onto_double_density_raster() {
        let layout = SurfaceLayout::new(0.0, 0.0, 800.0, 600.0);
        let input = PointerInput::Mouse(ClientPoint::new(100.0, 100.0));

        let p = map_to_raster(&layout, (1600, 1200), &input).unwrap();
        assert_eq!(p, Point::new(200.0, 200.0));
    }

    #[test]
    fn subtracts_surface_offset_before_scaling() {
        let layout = SurfaceLayout::new(50.0, 20.0, 400.0, 300.0);
        let input = PointerInput::Mouse(ClientPoint::new(150.0, 120.0));

        let p = map_to_raster(&layout, (800, 600), &input).unwrap();
        assert_eq!(p, Point::new(200.0, 200.0));
    }

    #[test]
    fn uses_first_touch_contact_only() {
        let layout = SurfaceLayout::new(0.0, 0.0, 100.0, 100.0);
        let input = PointerInput::Touch(vec![
            ClientPoint::new(10.0, 20.0),
            ClientPoint::new(90.0, 90.0),
        ]);

        let p = map_to_raster(&layout, (100, 100), &input).unwrap();
        assert_eq!(p, Point::new(10.0, 20.0));
    }

    #[test]
    fn touch_without_contacts_maps_to_nothing() {
        let layout = SurfaceLayout::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(
            map_to_raster(&layout, (100, 100), &PointerInput::Touch(vec![])),
            None
        );
    }

    #[test]
    fn hidden_surface_maps_to_nothing() {
        let input = PointerInput::Mouse(ClientPoint::new(10.0, 10.0));
        assert_eq!(
            map_to_raster(&SurfaceLayout::default(), (100, 100), &input),
            None
        );
    }

    #[test]
    fn points_outside_the_raster_are_pulled_to_its_edges() {
        assert_eq!(
            clamp_to_raster(Point::new(-40.0, 400.0), (100, 100)),
            Point::new(0.0, 100.0)
        );
        assert_eq!(
            clamp_to_raster(Point::new(30.0, 60.0), (100, 100)),
            Point::new(30.0, 60.0)
        );
    }

    #[test]
    fn native_layout_is_identity() {
        let layout = SurfaceLayout::native((640, 480));
        let input = PointerInput::Mouse(ClientPoint::new(33.0, 44.0));
        assert_eq!(
            map_to_raster(&layout, (640, 480), &input),
            Some(Point::new(33.0, 44.0))
        );
    }
}
