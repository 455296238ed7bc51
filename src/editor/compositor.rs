//! Raster surface compositing
//!
//! The compositor owns the raster surface and an unmarked snapshot of the
//! last painted page. Every redraw copies the snapshot back onto the surface
//! before stroking any rectangle, so overlays from earlier pointer moves
//! never pile up on the surface.

use std::sync::Arc;

use image::{Rgba, RgbaImage};

use super::geometry::Rect;
use crate::settings::StrokeSettings;

/// Immutable capture of a fully painted, unmarked page
#[derive(Clone, Debug)]
pub struct PageSnapshot(Arc<RgbaImage>);

impl PageSnapshot {
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.0
    }
}

/// Owns the raster surface and redraws crop overlays onto it
#[derive(Debug)]
pub struct Compositor {
    surface: RgbaImage,
    snapshot: Option<PageSnapshot>,
    stroke: StrokeSettings,
}

impl Compositor {
    #[must_use]
    pub fn new(stroke: StrokeSettings) -> Self {
        Self {
            surface: RgbaImage::new(0, 0),
            snapshot: None,
            stroke,
        }
    }

    /// Current surface contents, including any overlay
    #[must_use]
    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&PageSnapshot> {
        self.snapshot.as_ref()
    }

    /// Internal pixel dimensions of the surface
    #[must_use]
    pub fn pixel_size(&self) -> (u32, u32) {
        self.surface.dimensions()
    }

    /// Replace the surface with a freshly painted page raster
    pub fn present(&mut self, raster: &RgbaImage) {
        self.surface = raster.clone();
    }

    /// Capture the current surface as the new unmarked snapshot
    pub fn capture_snapshot(&mut self) {
        self.snapshot = Some(PageSnapshot(Arc::new(self.surface.clone())));
    }

    /// Restore the snapshot and stroke the stored box, if any
    pub fn redraw(&mut self, stored: Option<&Rect>) {
        self.restore();
        if let Some(rect) = stored {
            stroke_dashed_rect(&mut self.surface, rect, &self.stroke);
        }
    }

    /// Restore the snapshot, stroke the stored box, then the live drag rectangle
    pub fn redraw_with_live_rect(&mut self, stored: Option<&Rect>, live: &Rect) {
        self.redraw(stored);
        stroke_dashed_rect(&mut self.surface, live, &self.stroke);
    }

    fn restore(&mut self) {
        if let Some(snapshot) = &self.snapshot {
            if self.surface.dimensions() == snapshot.0.dimensions() {
                self.surface.copy_from_slice(snapshot.0.as_raw());
            } else {
                self.surface = (*snapshot.0).clone();
            }
        }
    }
}

/// Walks the rectangle outline and records which pixels the dash pattern covers
struct DashPen {
    mask: Vec<bool>,
    width: i64,
    height: i64,
    offsets: std::ops::RangeInclusive<i64>,
    dash_on: u64,
    period: u64,
    travelled: u64,
}

impl DashPen {
    fn new(width: u32, height: u32, stroke: &StrokeSettings) -> Self {
        let line = i64::from(stroke.line_width.max(1));
        let [on, off] = stroke.dash;
        Self {
            mask: vec![false; width as usize * height as usize],
            width: i64::from(width),
            height: i64::from(height),
            offsets: -(line / 2)..=(line - line / 2 - 1),
            dash_on: u64::from(on),
            period: u64::from(on) + u64::from(off),
            travelled: 0,
        }
    }

    /// One pixel step along the outline; `horizontal` is the edge direction
    fn step(&mut self, x: i64, y: i64, horizontal: bool) {
        let inked = self.period == 0 || self.travelled % self.period < self.dash_on;
        self.travelled += 1;
        if !inked {
            return;
        }
        for o in self.offsets.clone() {
            let (px, py) = if horizontal { (x, y + o) } else { (x + o, y) };
            if px >= 0 && py >= 0 && px < self.width && py < self.height {
                self.mask[(py * self.width + px) as usize] = true;
            }
        }
    }

    /// Walk `len` steps from `start` in direction `dir` (+1 or -1) along the
    /// line at `fixed`. Only the part that can touch the surface is visited;
    /// skipped steps still advance the dash phase.
    fn edge(&mut self, start: i64, len: i64, dir: i64, fixed: i64, horizontal: bool) {
        let len = len.max(0);
        let (extent, across) = if horizontal {
            (self.width, self.height)
        } else {
            (self.height, self.width)
        };
        let band = (fixed + self.offsets.start(), fixed + self.offsets.end());
        if band.1 < 0 || band.0 >= across {
            self.travelled += len as u64;
            return;
        }

        let (lo, hi) = if dir > 0 {
            ((-start).max(0), (extent - start).min(len))
        } else {
            ((start - extent + 1).max(0), (start + 1).min(len))
        };
        let lo = lo.min(len);
        let hi = hi.max(lo);

        self.travelled += lo as u64;
        for i in lo..hi {
            let along = start + dir * i;
            if horizontal {
                self.step(along, fixed, true);
            } else {
                self.step(fixed, along, false);
            }
        }
        self.travelled += (len - hi) as u64;
    }
}

/// Stroke `rect` onto `surface` with the dashed selection style.
///
/// The dash pattern runs continuously around the outline, clockwise from the
/// top-left corner. Each covered pixel is blended once, so overlapping
/// corners do not darken.
pub fn stroke_dashed_rect(surface: &mut RgbaImage, rect: &Rect, stroke: &StrokeSettings) {
    let (width, height) = surface.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let x0 = rect.x.round() as i64;
    let y0 = rect.y.round() as i64;
    let x1 = rect.right().round() as i64;
    let y1 = rect.bottom().round() as i64;

    let mut pen = DashPen::new(width, height, stroke);
    pen.edge(x0, x1 - x0, 1, y0, true);
    pen.edge(y0, y1 - y0, 1, x1, false);
    pen.edge(x1, x1 - x0, -1, y1, true);
    pen.edge(y1, y1 - y0, -1, x0, false);

    let color = Rgba(stroke.color);
    for (i, _) in pen.mask.iter().enumerate().filter(|(_, inked)| **inked) {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        let blended = blend_over(*surface.get_pixel(x, y), color);
        surface.put_pixel(x, y, blended);
    }
}

/// Source-over blend of `src` onto `dst`
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = u32::from(src[3]);
    let inv = 255 - a;
    let mix = |s: u8, d: u8| ((u32::from(s) * a + u32::from(d) * inv + 127) / 255) as u8;
    let out_a = a + (u32::from(dst[3]) * inv + 127) / 255;
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        out_a.min(255) as u8,
    ])
}
