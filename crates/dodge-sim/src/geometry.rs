//! Axis-aligned rectangles.

/// An axis-aligned rectangle with its origin at the top-left corner.
/// `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// A rectangle of the given size centred on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, w, h)
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    /// Shrinks the rectangle around its own centre. Scales are clamped to
    /// `0.0..=1.0`.
    pub fn deflate_around_center(&self, scale_x: f32, scale_y: f32) -> Rect {
        let w = self.w * scale_x.clamp(0.0, 1.0);
        let h = self.h * scale_y.clamp(0.0, 1.0);
        Rect::centered(self.center_x(), self.center_y(), w, h)
    }

    /// Strict overlap: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deflate_keeps_center() {
        let r = Rect::new(10.0, 20.0, 40.0, 40.0);
        let d = r.deflate_around_center(0.5, 0.5);
        assert_eq!(d, Rect::new(20.0, 30.0, 20.0, 20.0));
        assert_eq!(d.center_x(), r.center_x());
    }

    #[test]
    fn test_deflate_clamps_scale() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(r.deflate_around_center(2.0, -1.0), Rect::new(0.0, 5.0, 10.0, 0.0));
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(a.intersects(&Rect::new(9.5, 9.5, 10.0, 10.0)));
    }
}
