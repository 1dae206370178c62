//! Avatar rendering: a padded square crop around the representative's
//! box, resized and JPEG-encoded, delivered both as a base64 payload and
//! a persisted file.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::detection::domain::observation::FaceObservation;
use crate::error::ProcessError;
use crate::shared::bbox::clamped_square;

/// A rendered avatar for one face group (or one face in image mode).
#[derive(Clone, Debug)]
pub struct Avatar {
    pub jpeg: Vec<u8>,
    pub base64: String,
    pub path: PathBuf,
}

pub struct AvatarRenderer {
    size: u32,
    padding: f32,
    quality: u8,
}

impl AvatarRenderer {
    pub fn new(size: u32, padding: f32, quality: u8) -> Self {
        Self {
            size,
            padding,
            quality,
        }
    }

    /// Crops, resizes, and encodes the avatar, writing the JPEG to
    /// `output_path`.
    ///
    /// The crop square is computed in frame space with the same
    /// clamp-and-recenter rule used when the patch was retained, so it
    /// always lies inside the patch.
    pub fn render(
        &self,
        observation: &FaceObservation,
        output_path: &Path,
    ) -> Result<Avatar, ProcessError> {
        let bbox = &observation.face.bounding_box;
        let long_side = bbox.width().max(bbox.height()).max(1.0);
        let (cx, cy) = bbox.center();
        let (x, y, side) = clamped_square(
            cx,
            cy,
            long_side * (1.0 + 2.0 * self.padding),
            observation.patch.frame_width,
            observation.patch.frame_height,
        );

        let patch = &observation.patch;
        let local_x = x.saturating_sub(patch.origin.0);
        let local_y = y.saturating_sub(patch.origin.1);
        let crop = patch.pixels.crop(local_x, local_y, side, side);

        let img = RgbImage::from_raw(crop.width(), crop.height(), crop.data().to_vec())
            .ok_or_else(|| ProcessError::Avatar("crop buffer has wrong length".into()))?;
        let resized =
            image::imageops::resize(&img, self.size, self.size, image::imageops::FilterType::Triangle);

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality)
            .encode(resized.as_raw(), self.size, self.size, image::ExtendedColorType::Rgb8)
            .map_err(|e| ProcessError::Avatar(e.to_string()))?;

        std::fs::write(output_path, &jpeg)?;

        let base64 = base64::engine::general_purpose::STANDARD.encode(&jpeg);
        Ok(Avatar {
            jpeg,
            base64,
            path: output_path.to_path_buf(),
        })
    }
}
