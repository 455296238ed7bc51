//! MuPDF-backed page renderer

use image::{Rgba, RgbaImage};
use mupdf::{Colorspace, Document, Matrix, Page, Pixmap};

use super::backend::{DocumentHandle, PageHandle, PageRenderer};
use super::request::{DocumentOpenError, RenderError};

const PDF_MIME: &str = "application/pdf";

/// Renders PDF pages through MuPDF
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfRenderer;

impl PageRenderer for MupdfRenderer {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn DocumentHandle>, DocumentOpenError> {
        let doc = Document::from_bytes(bytes, PDF_MIME)
            .map_err(|e| DocumentOpenError::unreadable(e.to_string()))?;
        let page_count = doc
            .page_count()
            .map_err(|e| DocumentOpenError::unreadable(e.to_string()))?;

        Ok(Box::new(MupdfDocument {
            doc,
            page_count: usize::try_from(page_count).unwrap_or(0),
        }))
    }
}

struct MupdfDocument {
    doc: Document,
    page_count: usize,
}

impl DocumentHandle for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page(&self, number: usize) -> Result<Box<dyn PageHandle + '_>, RenderError> {
        if number == 0 || number > self.page_count {
            return Err(RenderError::PageOutOfRange {
                page: number,
                page_count: self.page_count,
            });
        }

        let page = self
            .doc
            .load_page((number - 1) as i32)
            .map_err(|e| RenderError::paint(number, e.to_string()))?;
        let bounds = page
            .bounds()
            .map_err(|e| RenderError::paint(number, e.to_string()))?;

        Ok(Box::new(MupdfPage {
            page,
            number,
            size: (bounds.x1 - bounds.x0, bounds.y1 - bounds.y0),
        }))
    }
}

struct MupdfPage {
    page: Page,
    number: usize,
    size: (f32, f32),
}

impl PageHandle for MupdfPage {
    fn intrinsic_size(&self) -> (f32, f32) {
        self.size
    }

    fn paint(&self, surface: &mut RgbaImage, scale: f32) -> Result<(), RenderError> {
        let rgb = Colorspace::device_rgb();
        let pixmap = self
            .page
            .to_pixmap(&Matrix::new_scale(scale, scale), &rgb, false, false)
            .map_err(|e| RenderError::paint(self.number, e.to_string()))?;

        copy_pixmap(&pixmap, surface).map_err(|detail| RenderError::paint(self.number, detail))
    }
}

/// Copy RGB(A) pixmap samples into the surface, clipped to the smaller of the two
fn copy_pixmap(pixmap: &Pixmap, surface: &mut RgbaImage) -> Result<(), String> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(format!("Unsupported pixmap format: {n} channels"));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    if samples.len() < stride.saturating_mul(height) || width * n > stride {
        return Err("Pixmap buffer size mismatch".to_string());
    }

    let copy_w = width.min(surface.width() as usize);
    let copy_h = height.min(surface.height() as usize);
    for y in 0..copy_h {
        let row = &samples[y * stride..y * stride + width * n];
        for (x, px) in row.chunks_exact(n).take(copy_w).enumerate() {
            surface.put_pixel(x as u32, y as u32, Rgba([px[0], px[1], px[2], 255]));
        }
    }
    Ok(())
}
