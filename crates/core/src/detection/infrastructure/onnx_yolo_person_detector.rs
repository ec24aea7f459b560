use std::path::Path;

use crate::detection::domain::person_detector::PersonDetector;
use crate::shared::frame::Frame;

use super::yolo::YoloModel;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YoloConfig {
    pub confidence: f64,
    pub iou: f64,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            confidence: 0.25,
            iou: 0.45,
        }
    }
}

/// Person boxes from a COCO-trained YOLO model (class 0 is "person").
///
/// Like the face embedder, a model that fails to load yields an unavailable
/// detector rather than a construction error.
pub struct OnnxYoloPersonDetector {
    model: Option<YoloModel>,
    config: YoloConfig,
}

impl OnnxYoloPersonDetector {
    pub fn load(model_path: &Path, config: YoloConfig) -> Self {
        let model = YoloModel::load(model_path)
            .map_err(|e| log::warn!("Person model unavailable: {e}"))
            .ok();
        Self { model, config }
    }
}

impl PersonDetector for OnnxYoloPersonDetector {
    fn is_available(&self) -> bool {
        self.model.is_some()
    }

    fn detect_person_boxes(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<[i32; 4]>, Box<dyn std::error::Error>> {
        let model = self
            .model
            .as_mut()
            .ok_or("person model is not available")?;
        let detections = model.detect(frame, self.config.confidence, self.config.iou)?;
        Ok(detections
            .iter()
            .map(|d| d.bbox.map(|v| v as i32))
            .collect())
    }
}
