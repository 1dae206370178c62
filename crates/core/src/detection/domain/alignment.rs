//! Face alignment geometry: 4-DOF similarity transforms between frame
//! space, the pose-normalization patch, and the embedding crop.

use crate::shared::frame::Frame;

pub type Point = (f32, f32);

/// ArcFace reference landmarks for a 112x112 aligned crop:
/// left eye, right eye, nose, left mouth corner, right mouth corner.
pub const FACE_TEMPLATE_112: [Point; 5] = [
    (38.2946, 51.6963),
    (73.5318, 51.5014),
    (56.0252, 71.7366),
    (41.5493, 92.3655),
    (70.7299, 92.2041),
];

/// The 112-space template scaled to a square crop of side `size`.
pub fn scaled_template(size: u32) -> [Point; 5] {
    let s = size as f32 / 112.0;
    let mut out = FACE_TEMPLATE_112;
    for p in &mut out {
        p.0 *= s;
        p.1 *= s;
    }
    out
}

/// 2x3 similarity transform (scale + rotation + translation):
///
/// ```text
/// | a  -b  tx |
/// | b   a  ty |
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Similarity {
    pub a: f32,
    pub b: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Similarity {
    pub const IDENTITY: Similarity = Similarity {
        a: 1.0,
        b: 0.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Pure translation/scale transform (no rotation).
    pub fn scale_translate(scale: f32, tx: f32, ty: f32) -> Similarity {
        Similarity {
            a: scale,
            b: 0.0,
            tx,
            ty,
        }
    }

    /// Least-squares fit mapping `src` points onto `dst` points.
    ///
    /// Builds the normal equations of the overdetermined system and solves
    /// the 4x4 result by Gaussian elimination with partial pivoting. Falls
    /// back to identity when the system is singular (coincident points).
    pub fn estimate(src: &[Point; 5], dst: &[Point; 5]) -> Similarity {
        // Each pair contributes two rows over unknowns [a, b, tx, ty]:
        //   sx*a - sy*b + tx = dx
        //   sy*a + sx*b + ty = dy
        let mut ata = [[0.0f32; 4]; 4];
        let mut atb = [0.0f32; 4];

        for i in 0..5 {
            let (sx, sy) = src[i];
            let (dx, dy) = dst[i];
            let rows = [([sx, -sy, 1.0, 0.0], dx), ([sy, sx, 0.0, 1.0], dy)];
            for (row, rhs) in rows {
                for j in 0..4 {
                    for k in 0..4 {
                        ata[j][k] += row[j] * row[k];
                    }
                    atb[j] += row[j] * rhs;
                }
            }
        }

        match solve_4x4(&ata, &atb) {
            Some([a, b, tx, ty]) => Similarity { a, b, tx, ty },
            None => Similarity::IDENTITY,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        (
            self.a * p.0 - self.b * p.1 + self.tx,
            self.b * p.0 + self.a * p.1 + self.ty,
        )
    }

    /// Inverse transform, or identity when this transform is degenerate.
    pub fn invert(&self) -> Similarity {
        let det = self.a * self.a + self.b * self.b;
        if det.abs() < 1e-12 {
            return Similarity::IDENTITY;
        }
        let ia = self.a / det;
        let ib = -self.b / det;
        Similarity {
            a: ia,
            b: ib,
            tx: -(ia * self.tx - ib * self.ty),
            ty: -(ib * self.tx + ia * self.ty),
        }
    }

    /// Warps the frame into a `width` x `height` RGB patch.
    ///
    /// Bilinear interpolation; source pixels outside the frame read as
    /// black.
    pub fn warp_rgb(&self, frame: &Frame, width: u32, height: u32) -> Vec<u8> {
        let inv = self.invert();
        let fw = frame.width() as i64;
        let fh = frame.height() as i64;
        let data = frame.data();

        let sample = |x: i64, y: i64, c: usize| -> f32 {
            if x >= 0 && x < fw && y >= 0 && y < fh {
                data[(y as usize * fw as usize + x as usize) * 3 + c] as f32
            } else {
                0.0
            }
        };

        let mut out = vec![0u8; width as usize * height as usize * 3];
        for oy in 0..height {
            for ox in 0..width {
                let (sx, sy) = inv.apply((ox as f32, oy as f32));
                let x0 = sx.floor() as i64;
                let y0 = sy.floor() as i64;
                let fx = sx - x0 as f32;
                let fy = sy - y0 as f32;

                let o = (oy as usize * width as usize + ox as usize) * 3;
                for c in 0..3 {
                    let v = sample(x0, y0, c) * (1.0 - fx) * (1.0 - fy)
                        + sample(x0 + 1, y0, c) * fx * (1.0 - fy)
                        + sample(x0, y0 + 1, c) * (1.0 - fx) * fy
                        + sample(x0 + 1, y0 + 1, c) * fx * fy;
                    out[o + c] = v.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
        out
    }
}

/// Gaussian elimination with partial pivoting; `None` when singular.
fn solve_4x4(ata: &[[f32; 4]; 4], atb: &[f32; 4]) -> Option<[f32; 4]> {
    let mut m = [[0.0f32; 5]; 4];
    for i in 0..4 {
        m[i][..4].copy_from_slice(&ata[i]);
        m[i][4] = atb[i];
    }

    for col in 0..4 {
        let pivot_row = (col..4).max_by(|&r, &s| {
            m[r][col]
                .abs()
                .partial_cmp(&m[s][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        m.swap(col, pivot_row);

        let pivot = m[col][col];
        if pivot.abs() < 1e-12 {
            return None;
        }
        for row in (col + 1)..4 {
            let factor = m[row][col] / pivot;
            for j in col..5 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let mut x = [0.0f32; 4];
    for i in (0..4).rev() {
        x[i] = m[i][4];
        for j in (i + 1)..4 {
            x[i] -= m[i][j] * x[j];
        }
        x[i] /= m[i][i];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_estimate_identity() {
        let m = Similarity::estimate(&FACE_TEMPLATE_112, &FACE_TEMPLATE_112);
        assert_relative_eq!(m.a, 1.0, epsilon = 1e-3);
        assert_relative_eq!(m.b, 0.0, epsilon = 1e-3);
        assert_relative_eq!(m.tx, 0.0, epsilon = 1e-2);
        assert_relative_eq!(m.ty, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn test_estimate_recovers_scale() {
        let mut src = FACE_TEMPLATE_112;
        for p in &mut src {
            p.0 *= 2.0;
            p.1 *= 2.0;
        }
        let m = Similarity::estimate(&src, &FACE_TEMPLATE_112);
        assert_relative_eq!(m.a, 0.5, epsilon = 1e-2);
        assert_relative_eq!(m.b, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn test_estimate_recovers_translation() {
        let mut src = FACE_TEMPLATE_112;
        for p in &mut src {
            p.0 += 30.0;
            p.1 -= 12.0;
        }
        let m = Similarity::estimate(&src, &FACE_TEMPLATE_112);
        assert_relative_eq!(m.tx, -30.0, epsilon = 0.1);
        assert_relative_eq!(m.ty, 12.0, epsilon = 0.1);
    }

    #[test]
    fn test_estimate_degenerate_points_falls_back_to_identity() {
        let src = [(5.0, 5.0); 5];
        let dst = FACE_TEMPLATE_112;
        let m = Similarity::estimate(&src, &dst);
        // Coincident source points make the system singular
        assert_eq!(m, Similarity::IDENTITY);
    }

    #[test]
    fn test_apply_then_invert_round_trips() {
        let m = Similarity {
            a: 1.3,
            b: 0.4,
            tx: -20.0,
            ty: 8.5,
        };
        let p = (57.0, 91.0);
        let (rx, ry) = m.invert().apply(m.apply(p));
        assert_relative_eq!(rx, p.0, epsilon = 1e-3);
        assert_relative_eq!(ry, p.1, epsilon = 1e-3);
    }

    #[test]
    fn test_invert_degenerate_is_identity() {
        let m = Similarity {
            a: 0.0,
            b: 0.0,
            tx: 3.0,
            ty: 4.0,
        };
        assert_eq!(m.invert(), Similarity::IDENTITY);
    }

    #[test]
    fn test_scaled_template() {
        let t = scaled_template(224);
        assert_relative_eq!(t[0].0, FACE_TEMPLATE_112[0].0 * 2.0, epsilon = 1e-4);
        assert_relative_eq!(t[4].1, FACE_TEMPLATE_112[4].1 * 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_warp_output_dimensions() {
        let frame = Frame::new(vec![128u8; 64 * 48 * 3], 64, 48, 0);
        let out = Similarity::IDENTITY.warp_rgb(&frame, 112, 112);
        assert_eq!(out.len(), 112 * 112 * 3);
    }

    #[test]
    fn test_warp_moves_bright_patch_to_template_position() {
        // Paint a bright patch at a synthetic left-eye position; after the
        // alignment warp it must land near the template's left eye.
        let w = 200u32;
        let h = 200u32;
        let mut data = vec![0u8; (w * h * 3) as usize];
        let src: [Point; 5] = [
            (80.0, 60.0),
            (120.0, 60.0),
            (100.0, 85.0),
            (85.0, 110.0),
            (115.0, 110.0),
        ];
        for dy in -2i64..=2 {
            for dx in -2i64..=2 {
                let x = (src[0].0 as i64 + dx) as usize;
                let y = (src[0].1 as i64 + dy) as usize;
                let o = (y * w as usize + x) * 3;
                data[o..o + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        let frame = Frame::new(data, w, h, 0);

        let m = Similarity::estimate(&src, &FACE_TEMPLATE_112);
        let aligned = m.warp_rgb(&frame, 112, 112);

        let (ex, ey) = (
            FACE_TEMPLATE_112[0].0.round() as usize,
            FACE_TEMPLATE_112[0].1.round() as usize,
        );
        let mut max_val = 0u8;
        for dy in 0..3usize {
            for dx in 0..3usize {
                let x = ex - 1 + dx;
                let y = ey - 1 + dy;
                max_val = max_val.max(aligned[(y * 112 + x) * 3]);
            }
        }
        assert!(max_val > 100, "expected bright pixel near template eye, max={max_val}");
    }
}
