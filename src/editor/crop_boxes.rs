//! Committed crop regions, one per page

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// A committed rectangle plus the scale it was drawn at.
///
/// Coordinates are raster pixels at `scale` and are never rescaled after
/// storage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    #[serde(flatten)]
    pub rect: Rect,
    pub scale: f32,
}

impl CropBox {
    #[must_use]
    pub const fn new(rect: Rect, scale: f32) -> Self {
        Self { rect, scale }
    }
}

/// Read-only copy of all crop boxes keyed by zero-based page index
pub type Selections = BTreeMap<usize, CropBox>;

/// Holds at most one crop box per page index
#[derive(Debug, Default)]
pub struct CropBoxStore {
    boxes: BTreeMap<usize, CropBox>,
}

impl CropBoxStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `crop_box` for `page_index`, replacing any previous box.
    /// Returns the replaced box.
    pub fn set(&mut self, page_index: usize, crop_box: CropBox) -> Option<CropBox> {
        self.boxes.insert(page_index, crop_box)
    }

    #[must_use]
    pub fn get(&self, page_index: usize) -> Option<&CropBox> {
        self.boxes.get(&page_index)
    }

    /// Remove the box for `page_index`; a missing entry is not an error
    pub fn clear(&mut self, page_index: usize) -> Option<CropBox> {
        self.boxes.remove(&page_index)
    }

    pub fn clear_all(&mut self) {
        self.boxes.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Snapshot of every stored box
    #[must_use]
    pub fn snapshot(&self) -> Selections {
        self.boxes.clone()
    }
}
