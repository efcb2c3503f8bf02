//! Box representations and overlap measures.
//!
//! Detector heads emit boxes as center/size tuples; everything downstream of
//! the decoder works with corner boxes normalized to the unit square of the
//! source image. Pixel conversions only happen at the geometry filter.

/// Axis-aligned box given by its center and size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterBox {
    /// Center x coordinate.
    pub cx: f32,
    /// Center y coordinate.
    pub cy: f32,
    /// Box width.
    pub w: f32,
    /// Box height.
    pub h: f32,
}

impl CenterBox {
    /// Creates a center box.
    pub fn new(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self { cx, cy, w, h }
    }

    /// Converts to the corner representation.
    pub fn to_bbox(self) -> BoundingBox {
        let half_w = self.w * 0.5;
        let half_h = self.h * 0.5;
        BoundingBox {
            left: self.cx - half_w,
            top: self.cy - half_h,
            right: self.cx + half_w,
            bottom: self.cy + half_h,
        }
    }

    /// True when all four fields are finite.
    pub fn is_finite(&self) -> bool {
        self.cx.is_finite() && self.cy.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    /// Divides x/width by `sx` and y/height by `sy`.
    pub fn scaled(self, sx: f32, sy: f32) -> Self {
        Self {
            cx: self.cx / sx,
            cy: self.cy / sy,
            w: self.w / sx,
            h: self.h / sy,
        }
    }
}

/// Axis-aligned box given by its corners.
///
/// Outside the decoder the coordinates are fractions of the source image
/// dimensions; `left < right` and `top < bottom` hold for every box that
/// survived [`BoundingBox::is_valid`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Right edge.
    pub right: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl BoundingBox {
    /// Creates a corner box.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Returns the box width (negative for inverted boxes).
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Returns the box height (negative for inverted boxes).
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Returns the area, or zero for degenerate or inverted boxes.
    pub fn area(&self) -> f32 {
        let w = self.width();
        let h = self.height();
        if w > 0.0 && h > 0.0 {
            w * h
        } else {
            0.0
        }
    }

    /// Returns the center representation.
    pub fn to_center(&self) -> CenterBox {
        CenterBox {
            cx: (self.left + self.right) * 0.5,
            cy: (self.top + self.bottom) * 0.5,
            w: self.width(),
            h: self.height(),
        }
    }

    /// True when all edges are finite and the box has positive extent.
    pub fn is_valid(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
            && self.left < self.right
            && self.top < self.bottom
    }

    /// Clips every edge into `[0, 1]`.
    pub fn clamp_unit(&self) -> Self {
        Self {
            left: self.left.clamp(0.0, 1.0),
            top: self.top.clamp(0.0, 1.0),
            right: self.right.clamp(0.0, 1.0),
            bottom: self.bottom.clamp(0.0, 1.0),
        }
    }

    /// Scales a normalized box to pixel coordinates of a `width` x `height` image.
    pub fn to_pixels(&self, width: f32, height: f32) -> Self {
        Self {
            left: self.left * width,
            top: self.top * height,
            right: self.right * width,
            bottom: self.bottom * height,
        }
    }

    /// Elongation of the box, `max(w / h, h / w)`.
    ///
    /// Returns infinity when either side is not positive.
    pub fn aspect_ratio(&self) -> f32 {
        let w = self.width();
        let h = self.height();
        if w <= 0.0 || h <= 0.0 {
            return f32::INFINITY;
        }
        (w / h).max(h / w)
    }

    /// Area of the overlap with `other`, zero when disjoint.
    pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        let w = right - left;
        let h = bottom - top;
        if w > 0.0 && h > 0.0 {
            w * h
        } else {
            0.0
        }
    }
}

/// Intersection over union of two corner boxes.
///
/// Degenerate (zero-area) boxes have IoU 0 with any other box.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let area_a = a.area();
    let area_b = b.area();
    if area_a <= 0.0 || area_b <= 0.0 {
        return 0.0;
    }
    let inter = a.intersection_area(b);
    let union = area_a + area_b - inter;
    if union <= 0.0 {
        return 0.0;
    }
    inter / union
}
