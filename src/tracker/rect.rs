/// Axis-aligned bounding box in normalized image coordinates.
///
/// Stored as top-left corner plus size (TLWH). Two other formats are used at
/// the crate boundaries:
/// - TLBR: Top-Left X, Top-Left Y, Bottom-Right X, Bottom-Right Y
/// - CXCYWH: Center X, Center Y, Width, Height (the model's native layout)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create a Rect from its center and size.
    #[inline]
    pub fn from_cxcywh(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x2(), self.y2()]
    }

    #[inline]
    pub fn x2(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn y2(&self) -> f32 {
        self.y + self.height
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Move the box by `(dx, dy)` keeping its size.
    #[inline]
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Whether the box has a non-negative size and every corner lies inside
    /// the unit square.
    pub fn is_normalized(&self) -> bool {
        let unit = 0.0..=1.0;
        self.width >= 0.0 && self.height >= 0.0 && self.to_tlbr().iter().all(|v| unit.contains(v))
    }

    /// Whether any edge lies within `margin` of a frame border.
    pub fn touches_edge(&self, margin: f32) -> bool {
        self.x < margin || self.x2() > 1.0 - margin || self.y < margin || self.y2() > 1.0 - margin
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    ///
    /// Disjoint or touching boxes have zero intersection; a degenerate union
    /// yields 0 rather than NaN.
    pub fn iou(&self, other: &Rect) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.x2().min(other.x2());
        let y2 = self.y2().min(other.y2());

        let inter_width = (x2 - x1).max(0.0);
        let inter_height = (y2 - y1).max(0.0);
        let inter_area = inter_width * inter_height;

        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }
}
