use std::path::Path;

use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;

use super::detected_face::DetectedFace;

/// Face detection plus embedding extraction, treated as an opaque capability.
///
/// Instances are expensive to build (model loading) and are meant to be
/// created once and lent to each scan. `&mut self` because inference
/// sessions are not shareable.
pub trait FaceEmbedder: Send {
    /// False when the underlying models failed to load. Callers must check
    /// this before relying on `detect` returning real results.
    fn is_available(&self) -> bool;

    /// All faces in the frame. An empty result is normal, not an error.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;

    /// Embedding of the highest-scoring face in a still image, or `None`
    /// when no face is found.
    fn best_embedding(
        &mut self,
        image_path: &Path,
    ) -> Result<Option<Embedding>, Box<dyn std::error::Error>>;
}
