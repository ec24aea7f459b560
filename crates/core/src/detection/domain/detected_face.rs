use crate::shared::embedding::Embedding;

/// One face found in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    /// Detector score in [0, 1].
    pub confidence: f64,
    /// `[x1, y1, x2, y2]` in frame pixels.
    pub bbox: [f64; 4],
    /// `None` when the detection could not be embedded (e.g. degenerate crop).
    pub embedding: Option<Embedding>,
}

impl DetectedFace {
    /// Highest-scoring face, first one wins on equal scores.
    pub fn best(faces: Vec<DetectedFace>) -> Option<DetectedFace> {
        faces.into_iter().reduce(|best, face| {
            if face.confidence > best.confidence {
                face
            } else {
                best
            }
        })
    }
}
