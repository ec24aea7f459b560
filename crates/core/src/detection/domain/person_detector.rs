use crate::shared::frame::Frame;

/// Whole-body person detection, independent of face recognition.
pub trait PersonDetector: Send {
    fn is_available(&self) -> bool;

    /// `[x1, y1, x2, y2]` pixel boxes of people in the frame.
    fn detect_person_boxes(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<[i32; 4]>, Box<dyn std::error::Error>>;
}
