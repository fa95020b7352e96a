use glam::Vec2;

/// Axis-aligned rectangle in image pixel space, `min` being the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bbox {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bbox {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Builds a box from two arbitrary corners, ordering them so `min <= max`
    /// on both axes.
    ///
    /// ```
    /// use glam::Vec2;
    /// use ferrlayout_core::analysis::bbox::Bbox;
    /// let bbox = Bbox::from_corners(Vec2::new(10.0, 2.0), Vec2::new(4.0, 8.0));
    /// assert_eq!(bbox.min, Vec2::new(4.0, 2.0));
    /// assert_eq!(bbox.max, Vec2::new(10.0, 8.0));
    /// ```
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a box from a center point and a size, the layout YOLO heads emit.
    ///
    /// ```
    /// use glam::Vec2;
    /// use ferrlayout_core::analysis::bbox::Bbox;
    /// let bbox = Bbox::from_center_size(Vec2::new(100.0, 200.0), Vec2::new(50.0, 80.0));
    /// assert_eq!(bbox.min, Vec2::new(75.0, 160.0));
    /// assert_eq!(bbox.max, Vec2::new(125.0, 240.0));
    /// ```
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half_size = size.abs() / 2.0;
        Self {
            min: center - half_size,
            max: center + half_size,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f32 {
        let size = self.max - self.min;
        size.x * size.y
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Area shared with `other`, zero when the boxes do not overlap.
    pub fn intersection(&self, other: &Self) -> f32 {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);

        if max.x > min.x && max.y > min.y {
            (max.x - min.x) * (max.y - min.y)
        } else {
            0.
        }
    }

    /// Intersection over union.
    pub fn iou(&self, other: &Self) -> f32 {
        let intersection_area = self.intersection(other);
        let union_area = self.area() + other.area() - intersection_area;

        if union_area > 0.0 {
            intersection_area / union_area
        } else {
            0.0
        }
    }

    /// Intersection divided by the smaller of the two areas.
    ///
    /// Unlike IoU this reaches 1.0 when a small box sits entirely inside a
    /// large one, which is the common duplicate pattern for layout heads
    /// (a paragraph detected both alone and as part of a column).
    pub fn overlap_ratio(&self, other: &Self) -> f32 {
        let intersection_area = self.intersection(other);
        let min_area = self.area().min(other.area());

        if min_area > 0.0 {
            intersection_area / min_area
        } else {
            0.0
        }
    }

    /// `true` when `other` lies entirely inside `self`, edges included.
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    pub fn clamp(&self, min_bounds: Vec2, max_bounds: Vec2) -> Self {
        Self {
            min: self.min.clamp(min_bounds, max_bounds),
            max: self.max.clamp(min_bounds, max_bounds),
        }
    }

    /// Multiplies both corners by `factor`.
    pub fn scale(&self, factor: f32) -> Self {
        Self {
            min: self.min * factor,
            max: self.max * factor,
        }
    }

    /// Corners rounded to the nearest pixel, as `(x1, y1, x2, y2)`.
    pub fn rounded(&self) -> (i32, i32, i32, i32) {
        (
            self.min.x.round() as i32,
            self.min.y.round() as i32,
            self.max.x.round() as i32,
            self.max.y.round() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_corners_orders_points() {
        let bbox = Bbox::from_corners(Vec2::new(30.0, 40.0), Vec2::new(10.0, 5.0));
        assert_eq!(bbox.min, Vec2::new(10.0, 5.0));
        assert_eq!(bbox.max, Vec2::new(30.0, 40.0));
        assert_eq!(bbox.width(), 20.0);
        assert_eq!(bbox.height(), 35.0);
    }

    #[test]
    fn test_bbox_from_center_size_negative_size() {
        // Some exports emit negative extents; they describe the same box
        let bbox = Bbox::from_center_size(Vec2::new(10.0, 10.0), Vec2::new(-4.0, 6.0));
        assert_eq!(bbox.min, Vec2::new(8.0, 7.0));
        assert_eq!(bbox.max, Vec2::new(12.0, 13.0));
    }

    #[test]
    fn test_bbox_area_and_intersection() {
        let a = Bbox::new(Vec2::ZERO, Vec2::new(4.0, 4.0));
        let b = Bbox::new(Vec2::new(2.0, 2.0), Vec2::new(6.0, 6.0));
        let far = Bbox::new(Vec2::new(10.0, 10.0), Vec2::new(12.0, 12.0));

        assert_eq!(a.area(), 16.0);
        assert_eq!(a.intersection(&b), 4.0);
        assert_eq!(a.intersection(&far), 0.0);
        // touching edges do not count as overlap
        let touching = Bbox::new(Vec2::new(4.0, 0.0), Vec2::new(8.0, 4.0));
        assert_eq!(a.intersection(&touching), 0.0);
    }

    #[test]
    fn test_bbox_iou() {
        let a = Bbox::new(Vec2::ZERO, Vec2::new(2.0, 2.0));
        assert_eq!(a.iou(&a), 1.0);

        let b = Bbox::new(Vec2::new(1.0, 0.0), Vec2::new(3.0, 2.0));
        // intersection 2, union 6
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);

        let degenerate = Bbox::new(Vec2::ZERO, Vec2::ZERO);
        assert_eq!(degenerate.iou(&degenerate), 0.0);
    }

    #[test]
    fn test_bbox_overlap_ratio_containment() {
        let large = Bbox::new(Vec2::ZERO, Vec2::new(100.0, 100.0));
        let small = Bbox::new(Vec2::new(10.0, 10.0), Vec2::new(30.0, 30.0));

        assert_eq!(large.overlap_ratio(&small), 1.0);
        assert_eq!(small.overlap_ratio(&large), 1.0);
        assert!(large.iou(&small) < 0.1);
    }

    #[test]
    fn test_bbox_contains() {
        let outer = Bbox::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let inner = Bbox::new(Vec2::new(2.0, 3.0), Vec2::new(7.0, 8.0));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&outer));
    }

    #[test]
    fn test_bbox_clamp_and_scale() {
        let bbox = Bbox::new(Vec2::new(-10.0, 5.0), Vec2::new(1030.0, 2000.0));
        let clamped = bbox.clamp(Vec2::ZERO, Vec2::new(1024.0, 1024.0));
        assert_eq!(clamped.min, Vec2::new(0.0, 5.0));
        assert_eq!(clamped.max, Vec2::new(1024.0, 1024.0));

        let scaled = clamped.scale(0.5);
        assert_eq!(scaled.min, Vec2::new(0.0, 2.5));
        assert_eq!(scaled.max, Vec2::new(512.0, 512.0));
    }

    #[test]
    fn test_bbox_rounded() {
        let bbox = Bbox::new(Vec2::new(10.4, 10.5), Vec2::new(99.6, 120.49));
        assert_eq!(bbox.rounded(), (10, 11, 100, 120));
    }

    #[test]
    fn test_bbox_is_finite() {
        assert!(Bbox::new(Vec2::ZERO, Vec2::ONE).is_finite());
        assert!(!Bbox::new(Vec2::new(f32::NAN, 0.0), Vec2::ONE).is_finite());
    }
}
