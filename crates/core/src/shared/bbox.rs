/// Axis-aligned box in frame pixel space, stored as float corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Builds a box from center and size, as anchor detectors emit them.
    pub fn from_center_size(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Intersection-over-union with another box, in [0, 1].
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Clamps all corners to `[0, frame_w] x [0, frame_h]`.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> BoundingBox {
        let fw = frame_w as f32;
        let fh = frame_h as f32;
        BoundingBox::new(
            self.x1.clamp(0.0, fw),
            self.y1.clamp(0.0, fh),
            self.x2.clamp(0.0, fw),
            self.y2.clamp(0.0, fh),
        )
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Largest-possible square of the requested side centered on `(cx, cy)`,
/// clamped to the frame.
///
/// The side is capped at `min(frame_w, frame_h)` and the origin shifted as
/// needed, so the result is always a true square inside the frame. Returns
/// `(x, y, side)` in integer pixels.
pub fn clamped_square(cx: f32, cy: f32, side: f32, frame_w: u32, frame_h: u32) -> (u32, u32, u32) {
    let max_side = frame_w.min(frame_h).max(1);
    let side = (side.round() as u32).clamp(1, max_side);

    let half = side as f32 / 2.0;
    let x = (cx - half).round().clamp(0.0, (frame_w - side) as f32) as u32;
    let y = (cy - half).round().clamp(0.0, (frame_h - side) as f32) as u32;
    (x, y, side)
}
