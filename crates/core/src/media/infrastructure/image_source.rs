use std::path::Path;

use crate::media::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;
use crate::shared::media_info::MediaInfo;

/// Adapts a still image to the [`FrameSource`] interface.
///
/// The image becomes a one-frame stream with `fps = 0`, so image jobs run
/// through the same per-frame stage as video jobs.
pub struct ImageFileSource {
    frame: Option<Frame>,
    info: MediaInfo,
}

impl ImageFileSource {
    pub fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let rgb = image::open(path)?.into_rgb8();
        let (width, height) = rgb.dimensions();

        let codec = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let info = MediaInfo {
            width,
            height,
            fps: 0.0,
            total_frames: 1,
            codec,
            source_path: Some(path.to_path_buf()),
        };

        Ok(Self {
            frame: Some(Frame::new(rgb.into_raw(), width, height, 0)),
            info,
        })
    }
}

impl FrameSource for ImageFileSource {
    fn info(&self) -> &MediaInfo {
        &self.info
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        Box::new(self.frame.take().map(Ok).into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_png(dir: &Path, w: u32, h: u32) -> std::path::PathBuf {
        let path = dir.join("sample.png");
        let img = image::RgbImage::from_pixel(w, h, image::Rgb([40, 80, 120]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_open_reads_dimensions_and_codec() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(dir.path(), 12, 8);

        let source = ImageFileSource::open(&path).unwrap();
        let info = source.info();
        assert_eq!((info.width, info.height), (12, 8));
        assert_eq!(info.total_frames, 1);
        assert_eq!(info.fps, 0.0);
        assert_eq!(info.codec, "png");
        assert_eq!(info.file_name().as_deref(), Some("sample.png"));
    }

    #[test]
    fn test_yields_exactly_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(dir.path(), 4, 4);

        let mut source = ImageFileSource::open(&path).unwrap();
        let frames: Vec<_> = source.frames().collect();
        assert_eq!(frames.len(), 1);
        let frame = frames.into_iter().next().unwrap().unwrap();
        assert_eq!(frame.number(), 0);
        assert_eq!(frame.pixel(0, 0), [40, 80, 120]);

        // A second pass yields nothing; the frame was consumed.
        assert_eq!(source.frames().count(), 0);
    }

    #[test]
    fn test_open_missing_file_fails() {
        assert!(ImageFileSource::open(Path::new("/nonexistent/x.png")).is_err());
    }
}
