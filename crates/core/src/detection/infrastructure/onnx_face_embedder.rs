use std::path::Path;

use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::shared::constants::DEFAULT_DETECTION_CONFIDENCE;
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::video::domain::image_reader::ImageReader;

use super::arcface_model::ArcFaceModel;
use super::yolo::YoloModel;

/// NMS IoU threshold for face boxes.
const NMS_IOU_THRESH: f64 = 0.45;

struct Models {
    detector: YoloModel,
    embedder: ArcFaceModel,
}

/// YOLO face detection followed by ArcFace embedding of each face crop.
///
/// Construction never fails: if either model cannot be loaded the embedder
/// is still returned but reports `is_available() == false`, and every
/// inference call errors instead of pretending no faces were found.
pub struct OnnxFaceEmbedder {
    models: Option<Models>,
    image_reader: Box<dyn ImageReader>,
    detection_confidence: f64,
}

impl OnnxFaceEmbedder {
    pub fn load(
        face_model_path: &Path,
        embedding_model_path: &Path,
        image_reader: Box<dyn ImageReader>,
    ) -> Self {
        let models = YoloModel::load(face_model_path)
            .and_then(|detector| {
                ArcFaceModel::load(embedding_model_path).map(|embedder| Models { detector, embedder })
            })
            .map_err(|e| log::warn!("Face model unavailable: {e}"))
            .ok();

        Self {
            models,
            image_reader,
            detection_confidence: DEFAULT_DETECTION_CONFIDENCE,
        }
    }

    /// An embedder with no models, for when model files could not be resolved.
    pub fn unavailable(image_reader: Box<dyn ImageReader>) -> Self {
        Self {
            models: None,
            image_reader,
            detection_confidence: DEFAULT_DETECTION_CONFIDENCE,
        }
    }

    pub fn with_detection_confidence(mut self, confidence: f64) -> Self {
        self.detection_confidence = confidence;
        self
    }

    fn models(&mut self) -> Result<&mut Models, Box<dyn std::error::Error>> {
        self.models
            .as_mut()
            .ok_or_else(|| "face model is not available".into())
    }
}

impl FaceEmbedder for OnnxFaceEmbedder {
    fn is_available(&self) -> bool {
        self.models.is_some()
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        let confidence = self.detection_confidence;
        let models = self.models()?;
        let boxes = models.detector.detect(frame, confidence, NMS_IOU_THRESH)?;

        let mut faces = Vec::with_capacity(boxes.len());
        for raw in boxes {
            let embedding = match frame.square_crop(raw.bbox) {
                Some(crop) => Some(models.embedder.embed(&crop)?),
                None => None,
            };
            faces.push(DetectedFace {
                confidence: raw.confidence,
                bbox: raw.bbox,
                embedding,
            });
        }
        Ok(faces)
    }

    fn best_embedding(
        &mut self,
        image_path: &Path,
    ) -> Result<Option<Embedding>, Box<dyn std::error::Error>> {
        self.models()?;
        let image = self.image_reader.read(image_path)?;
        let faces = self.detect(&image)?;
        Ok(DetectedFace::best(faces).and_then(|face| face.embedding))
    }
}
