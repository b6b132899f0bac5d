//! Suppressed per-frame detection, the tracker's input.

use crate::tracker::rect::Rect;

/// One candidate object for a single frame, after suppression.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box in normalized coordinates
    pub bbox: Rect,
    /// Detection confidence score
    pub confidence: f32,
    /// Index of the winning class channel
    pub class_index: usize,
    /// Resolved label of `class_index`
    pub class_name: String,
}

impl Detection {
    /// Create a detection from TLBR corners.
    pub fn new(
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        confidence: f32,
        class_index: usize,
        class_name: impl Into<String>,
    ) -> Self {
        Self::from_rect(Rect::from_tlbr(x1, y1, x2, y2), confidence, class_index, class_name)
    }

    pub fn from_rect(
        bbox: Rect,
        confidence: f32,
        class_index: usize,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            bbox,
            confidence,
            class_index,
            class_name: class_name.into(),
        }
    }

    #[inline]
    pub fn x1(&self) -> f32 {
        self.bbox.x
    }

    #[inline]
    pub fn y1(&self) -> f32 {
        self.bbox.y
    }

    #[inline]
    pub fn x2(&self) -> f32 {
        self.bbox.x2()
    }

    #[inline]
    pub fn y2(&self) -> f32 {
        self.bbox.y2()
    }

    #[inline]
    pub fn w(&self) -> f32 {
        self.bbox.width
    }

    #[inline]
    pub fn h(&self) -> f32 {
        self.bbox.height
    }

    /// Centroid, the association key between frames.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        self.bbox.center()
    }
}
