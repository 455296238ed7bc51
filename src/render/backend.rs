//! Page renderer abstraction
//!
//! The editor never talks to a decoding library directly. A [`PageRenderer`]
//! opens document bytes into a [`DocumentHandle`], which hands out
//! [`PageHandle`]s that know their intrinsic size and can paint themselves
//! into a raster surface at a given scale.
//!
//! Handles are created and used on the render worker thread only, so they do
//! not need to be `Send`. The renderer itself is moved onto that thread.

use image::RgbaImage;

use super::request::{DocumentOpenError, RenderError};

/// Opens documents for rendering
pub trait PageRenderer: Send + 'static {
    /// Parse `bytes` into a document handle.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentOpenError`] when the input is empty, corrupt or unsupported.
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn DocumentHandle>, DocumentOpenError>;
}

/// An opened, paginated document
pub trait DocumentHandle {
    /// Total number of pages
    fn page_count(&self) -> usize;

    /// Load a page by its 1-based number.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the page does not exist or cannot be decoded.
    fn page(&self, number: usize) -> Result<Box<dyn PageHandle + '_>, RenderError>;
}

/// A single decoded page
pub trait PageHandle {
    /// Page size in points at scale 1.0 as `(width, height)`
    fn intrinsic_size(&self) -> (f32, f32);

    /// Paint the page into `surface` at `scale`.
    ///
    /// The surface is already sized to the scaled page dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if painting fails.
    fn paint(&self, surface: &mut RgbaImage, scale: f32) -> Result<(), RenderError>;
}

/// Raster dimensions for a page painted at `scale`, never smaller than 1x1
#[must_use]
pub fn surface_dimensions(intrinsic: (f32, f32), scale: f32) -> (u32, u32) {
    let to_px = |v: f32| {
        let px = (v * scale).floor();
        if px.is_finite() && px >= 1.0 {
            px as u32
        } else {
            1
        }
    };
    (to_px(intrinsic.0), to_px(intrinsic.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_dimensions_truncate_fractional_pixels() {
        assert_eq!(surface_dimensions((612.0, 792.0), 1.0), (612, 792));
        assert_eq!(surface_dimensions((612.0, 792.0), 1.25), (765, 990));
        assert_eq!(surface_dimensions((100.5, 50.9), 1.0), (100, 50));
    }

    #[test]
    fn surface_dimensions_never_collapse_to_zero() {
        assert_eq!(surface_dimensions((0.0, 0.0), 1.0), (1, 1));
        assert_eq!(surface_dimensions((100.0, 100.0), 0.001), (1, 1));
        assert_eq!(surface_dimensions((100.0, 100.0), f32::NAN), (1, 1));
    }
}
