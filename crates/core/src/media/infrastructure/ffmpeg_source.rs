use std::path::Path;

use crate::media::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;
use crate::shared::media_info::MediaInfo;

/// Sequential video decoder backed by ffmpeg-next.
///
/// Opens the best video stream, converts every decoded frame to RGB24
/// through the software scaler, and yields them lazily in decode order.
/// One decoder instance per source; never shared across threads.
pub struct FfmpegVideoSource {
    input: ffmpeg_next::format::context::Input,
    stream_index: usize,
    info: MediaInfo,
}

// Safety: the source is moved into a single decoder thread and never
// accessed concurrently; ffmpeg's raw pointers are not shared.
unsafe impl Send for FfmpegVideoSource {}

impl FfmpegVideoSource {
    pub fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let input = ffmpeg_next::format::input(path)?;
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("no video stream found")?;
        let stream_index = stream.index();

        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let info = MediaInfo {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames: stream.frames().max(0) as u64,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        Ok(Self {
            input,
            stream_index,
            info,
        })
    }
}

impl FrameSource for FfmpegVideoSource {
    fn info(&self) -> &MediaInfo {
        &self.info
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let stream = match self.input.stream(self.stream_index) {
            Some(s) => s,
            None => return Box::new(std::iter::once(Err("video stream vanished".into()))),
        };

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|ctx| ctx.decoder().video());
        let decoder = match decoder {
            Ok(d) => d,
            Err(e) => return Box::new(std::iter::once(Err(Box::new(e) as _))),
        };

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg_next::format::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        );
        let scaler = match scaler {
            Ok(s) => s,
            Err(e) => return Box::new(std::iter::once(Err(Box::new(e) as _))),
        };

        Box::new(DecodeIter {
            input: &mut self.input,
            decoder,
            scaler,
            stream_index: self.stream_index,
            width: self.info.width,
            height: self.info.height,
            next_number: 0,
            flushing: false,
            done: false,
        })
    }
}

/// Lazy decode loop: pulls packets, drains the decoder, flushes at EOF.
struct DecodeIter<'a> {
    input: &'a mut ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    next_number: u64,
    flushing: bool,
    done: bool,
}

impl DecodeIter<'_> {
    fn receive_one(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.scaler.run(&decoded, &mut rgb) {
            return Some(Err(Box::new(e)));
        }

        let frame = Frame::new(
            copy_rgb_rows(&rgb, self.width, self.height),
            self.width,
            self.height,
            self.next_number,
        );
        self.next_number += 1;
        Some(Ok(frame))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(result) = self.receive_one() {
            return Some(result);
        }
        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.input.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.receive_one() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }
            if let Some(result) = self.receive_one() {
                return Some(result);
            }
        }
    }
}

/// Copies scaler output row by row, dropping the stride padding ffmpeg
/// appends to each line.
fn copy_rgb_rows(rgb: &ffmpeg_next::util::frame::video::Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
