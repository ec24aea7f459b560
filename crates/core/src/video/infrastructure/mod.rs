pub mod ffmpeg_image_reader;
pub mod ffmpeg_reader;
mod rgb;
