use crate::shared::frame::Frame;
use crate::shared::media_info::MediaInfo;

/// Yields decoded frames from a video or image source.
///
/// Decoding is strictly sequential — sources are not required to support
/// seeking — so the pipeline decodes every frame and discards the ones the
/// sampler rejects.
pub trait FrameSource: Send {
    /// Stream metadata, available before the first frame is decoded.
    fn info(&self) -> &MediaInfo;

    /// Frames in decode order, numbered from zero.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;
}
