//! Raster scale for the page preview
//!
//! A scale is either an explicit zoom factor or the fit marker, which is
//! resolved against the container width once the page's intrinsic width is
//! known.

/// Requested raster scale
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Scale {
    /// Fit the page width to the container width
    #[default]
    Fit,
    /// Explicit zoom factor (1.0 = 100%)
    Factor(f32),
}

impl Scale {
    /// Returns true for the fit marker
    #[must_use]
    pub fn is_fit(self) -> bool {
        matches!(self, Self::Fit)
    }
}

/// Scale that makes a page of `page_intrinsic_width` fill `container_width`.
///
/// Returns 1.0 when either width is not positive, so a hidden container never
/// produces a degenerate raster.
#[must_use]
pub fn fit_scale(container_width: f32, page_intrinsic_width: f32) -> f32 {
    if container_width > 0.0 && page_intrinsic_width > 0.0 {
        container_width / page_intrinsic_width
    } else {
        1.0
    }
}

/// Resolve a requested scale to a numeric factor for a page.
#[must_use]
pub fn resolve(scale: Scale, container_width: f32, page_intrinsic_width: f32) -> f32 {
    match scale {
        Scale::Fit => fit_scale(container_width, page_intrinsic_width),
        Scale::Factor(factor) => factor,
    }
}

/// One zoom-in step from `current`.
#[must_use]
pub fn zoom_in(current: f32, step: f32) -> f32 {
    current + step
}

/// One zoom-out step from `current`, or `None` when already at `min_scale`.
///
/// The result never drops below `min_scale`.
#[must_use]
pub fn zoom_out(current: f32, step: f32, min_scale: f32) -> Option<f32> {
    if current <= min_scale + f32::EPSILON {
        None
    } else {
        Some((current - step).max(min_scale))
    }
}
