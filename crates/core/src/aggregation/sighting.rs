/// One accepted face match on a sampled frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Sighting {
    pub name: String,
    /// Match confidence in [0, 1].
    pub confidence: f64,
    /// Seconds from the start of the video.
    pub timestamp: f64,
    pub frame_index: usize,
}
