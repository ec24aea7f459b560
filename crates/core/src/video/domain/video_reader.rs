use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Sequential frame source for a video file.
///
/// Decoding is stateful and strictly forward-only: `frames` yields each frame
/// once, in source order, and stops at end of stream.
pub trait VideoReader: Send {
    /// Opens the file and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in decode order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases decoder and file handles. Must be safe to call repeatedly.
    fn close(&mut self);
}
