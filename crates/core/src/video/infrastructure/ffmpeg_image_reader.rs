use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_reader::ImageReader;

use super::rgb::{rgb_scaler, to_rgb_frame};

/// Decodes still images (JPEG, PNG, ...) through ffmpeg's image demuxers.
#[derive(Default)]
pub struct FfmpegImageReader;

impl FfmpegImageReader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageReader for FfmpegImageReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| format!("No image data in {}", path.display()))?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = codec_ctx.decoder().video()?;
        let mut scaler = rgb_scaler(&decoder)?;
        let (width, height) = (decoder.width(), decoder.height());

        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            if decoder.receive_frame(&mut decoded).is_ok() {
                return to_rgb_frame(&mut scaler, &decoded, width, height, 0);
            }
        }

        // Some formats only emit their single frame on flush.
        decoder.send_eof()?;
        if decoder.receive_frame(&mut decoded).is_ok() {
            return to_rgb_frame(&mut scaler, &decoded, width, height, 0);
        }
        Err(format!("Failed to decode image {}", path.display()).into())
    }
}
