use ndarray::ArrayView3;

/// A decoded video or image frame: contiguous RGB24 bytes in row-major order.
///
/// Color conversion happens at the media boundary only; every later stage
/// treats pixel data as plain RGB.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    number: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, number: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * 3,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            number,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Position of this frame in the source stream's decode order.
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, 3),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// RGB value at (x, y), with coordinates clamped to the frame bounds.
    pub fn pixel(&self, x: i64, y: i64) -> [u8; 3] {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        let offset = (cy * self.width as usize + cx) * 3;
        [self.data[offset], self.data[offset + 1], self.data[offset + 2]]
    }

    /// Copies a rectangular region into a new frame.
    ///
    /// The rectangle is clamped to the frame bounds; the result keeps this
    /// frame's stream number.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Frame {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let w = w.min(self.width - x).max(1);
        let h = h.min(self.height - y).max(1);

        let mut data = Vec::with_capacity(w as usize * h as usize * 3);
        for row in y..y + h {
            let start = (row as usize * self.width as usize + x as usize) * 3;
            data.extend_from_slice(&self.data[start..start + w as usize * 3]);
        }
        Frame::new(data, w, h, self.number)
    }

    /// Mean and standard deviation of luma (Rec. 601) over a region.
    ///
    /// The region is clamped to the frame bounds. Returns `(0.0, 0.0)` for
    /// a degenerate region.
    pub fn luma_stats(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> (f32, f32) {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        let x2 = x2.min(self.width);
        let y2 = y2.min(self.height);
        if x2 <= x1 || y2 <= y1 {
            return (0.0, 0.0);
        }

        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let count = ((x2 - x1) as f64) * ((y2 - y1) as f64);

        for row in y1..y2 {
            let base = (row as usize * self.width as usize) * 3;
            for col in x1..x2 {
                let o = base + col as usize * 3;
                let luma = 0.299 * self.data[o] as f64
                    + 0.587 * self.data[o + 1] as f64
                    + 0.114 * self.data[o + 2] as f64;
                sum += luma;
                sum_sq += luma * luma;
            }
        }

        let mean = sum / count;
        let variance = (sum_sq / count - mean * mean).max(0.0);
        (mean as f32, variance.sqrt() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solid_frame(w: u32, h: u32, rgb: [u8; 3]) -> Frame {
        let data: Vec<u8> = (0..w * h).flat_map(|_| rgb).collect();
        Frame::new(data, w, h, 0)
    }

    #[test]
    fn test_construction_and_accessors() {
        let frame = Frame::new(vec![0u8; 2 * 2 * 3], 2, 2, 7);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.number(), 7);
        assert_eq!(frame.data().len(), 12);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 0);
    }

    #[test]
    fn test_as_ndarray_shape_and_access() {
        let mut data = vec![0u8; 2 * 4 * 3];
        data[(1 * 4 + 2) * 3] = 255; // row 1, col 2, R
        let frame = Frame::new(data, 4, 2, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]);
        assert_eq!(arr[[1, 2, 0]], 255);
        assert_eq!(arr[[1, 2, 1]], 0);
    }

    #[test]
    fn test_pixel_clamps_out_of_bounds() {
        let frame = solid_frame(3, 3, [10, 20, 30]);
        assert_eq!(frame.pixel(-5, -5), [10, 20, 30]);
        assert_eq!(frame.pixel(100, 100), [10, 20, 30]);
    }

    #[test]
    fn test_crop_extracts_region() {
        // 4x4 frame, bottom-right 2x2 painted white
        let mut data = vec![0u8; 4 * 4 * 3];
        for y in 2..4 {
            for x in 2..4 {
                let o = (y * 4 + x) * 3;
                data[o..o + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        let frame = Frame::new(data, 4, 4, 3);
        let crop = frame.crop(2, 2, 2, 2);
        assert_eq!(crop.width(), 2);
        assert_eq!(crop.height(), 2);
        assert_eq!(crop.number(), 3);
        assert!(crop.data().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let frame = solid_frame(4, 4, [1, 2, 3]);
        let crop = frame.crop(3, 3, 10, 10);
        assert_eq!(crop.width(), 1);
        assert_eq!(crop.height(), 1);
    }

    #[test]
    fn test_luma_stats_uniform_region() {
        let frame = solid_frame(8, 8, [128, 128, 128]);
        let (mean, std) = frame.luma_stats(0, 0, 8, 8);
        assert_relative_eq!(mean, 128.0, epsilon = 0.01);
        assert_relative_eq!(std, 0.0, epsilon = 0.01);
    }

    #[test]
    fn test_luma_stats_half_black_half_white() {
        let mut data = vec![0u8; 2 * 2 * 3];
        data[0..3].copy_from_slice(&[255, 255, 255]);
        data[3..6].copy_from_slice(&[255, 255, 255]);
        let frame = Frame::new(data, 2, 2, 0);
        let (mean, std) = frame.luma_stats(0, 0, 2, 2);
        assert_relative_eq!(mean, 127.5, epsilon = 0.5);
        assert_relative_eq!(std, 127.5, epsilon = 0.5);
    }

    #[test]
    fn test_luma_stats_degenerate_region() {
        let frame = solid_frame(4, 4, [50, 50, 50]);
        assert_eq!(frame.luma_stats(2, 2, 2, 2), (0.0, 0.0));
        assert_eq!(frame.luma_stats(3, 3, 1, 1), (0.0, 0.0));
    }
}
