use std::path::PathBuf;

use super::constants::FALLBACK_FPS;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// As reported by the container; may be 0 or NaN when unknown.
    pub fps: f64,
    /// Container estimate, 0 when unknown. Used for progress only.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Frame rate to use for sampling and timestamps.
    pub fn effective_fps(&self) -> f64 {
        if self.fps.is_finite() && self.fps > 0.0 {
            self.fps
        } else {
            FALLBACK_FPS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn meta_with_fps(fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: 1920,
            height: 1080,
            fps,
            total_frames: 900,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/test.mp4")),
        }
    }

    #[test]
    fn test_reported_fps_is_used() {
        assert_eq!(meta_with_fps(25.0).effective_fps(), 25.0);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-12.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_unusable_fps_falls_back(#[case] fps: f64) {
        assert_eq!(meta_with_fps(fps).effective_fps(), FALLBACK_FPS);
    }
}
