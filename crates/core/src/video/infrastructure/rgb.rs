use crate::shared::frame::Frame;

/// Builds a same-size scaler from the decoder's native format to RGB24.
pub(crate) fn rgb_scaler(
    decoder: &ffmpeg_next::decoder::Video,
) -> Result<ffmpeg_next::software::scaling::Context, ffmpeg_next::Error> {
    ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        ffmpeg_next::format::Pixel::RGB24,
        decoder.width(),
        decoder.height(),
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
}

pub(crate) fn to_rgb_frame(
    scaler: &mut ffmpeg_next::software::scaling::Context,
    decoded: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
    index: usize,
) -> Result<Frame, Box<dyn std::error::Error>> {
    let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
    scaler.run(decoded, &mut rgb_frame)?;
    let pixels = packed_rgb_pixels(rgb_frame.data(0), rgb_frame.stride(0), width, height);
    Ok(Frame::new(pixels, width, height, 3, index))
}

/// Strips per-row padding (stride > width * 3) from an RGB24 plane.
fn packed_rgb_pixels(plane: &[u8], stride: usize, width: u32, height: u32) -> Vec<u8> {
    let row_bytes = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&plane[start..start + row_bytes]);
    }
    pixels
}
