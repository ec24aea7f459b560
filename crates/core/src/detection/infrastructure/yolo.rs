//! Shared pre/post-processing for single-class YOLO ONNX models.
//!
//! Both the face-pose model and the COCO person model emit rows of
//! `[cx, cy, w, h, score_0, ...]`; only the class-0 score is read here, so
//! trailing keypoints or other class scores are ignored.
use std::cmp::Ordering;
use std::path::Path;

use crate::shared::frame::Frame;

use super::onnx_session::load_session;

/// Fallback input resolution when the model's input shape is dynamic.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Letterbox padding value (YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    /// `[x1, y1, x2, y2]` in original frame pixels.
    pub bbox: [f64; 4],
    pub confidence: f64,
}

/// A loaded YOLO session plus its square input size.
pub struct YoloModel {
    session: ort::session::Session,
    input_size: u32,
}

impl YoloModel {
    pub fn load(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;

        // NCHW: [1, 3, H, W]; H == W for these models.
        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { ref shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::debug!(
            "Loaded YOLO model {} (input {input_size}px)",
            model_path.display()
        );
        Ok(Self {
            session,
            input_size,
        })
    }

    /// Runs inference and returns NMS-filtered class-0 boxes above `confidence`.
    pub fn detect(
        &mut self,
        frame: &Frame,
        confidence: f64,
        iou_threshold: f64,
    ) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }
        let letterboxed = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(letterboxed.tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut detections = decode_rows(data, &shape, confidence, &letterboxed.mapping)?;
        Ok(nms(&mut detections, iou_threshold))
    }
}

/// Maps letterbox coordinates back to the source frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LetterboxMapping {
    pub scale: f64,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl LetterboxMapping {
    fn to_frame(self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

pub struct Letterboxed {
    pub tensor: ndarray::Array4<f32>,
    pub mapping: LetterboxMapping,
}

/// Aspect-preserving nearest-neighbour resize into a gray-padded square,
/// normalized to [0, 1] in NCHW layout.
pub fn letterbox(frame: &Frame, target_size: u32) -> Letterboxed {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let mut tensor = ndarray::Array4::<f32>::from_elem(
        (1, 3, target_size as usize, target_size as usize),
        PAD_VALUE,
    );

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Letterboxed {
        tensor,
        mapping: LetterboxMapping {
            scale,
            pad_x,
            pad_y,
        },
    }
}

/// Parses a `[1, features, detections]` or `[1, detections, features]` output.
///
/// The smaller of the two trailing axes is taken to be the feature axis.
pub fn decode_rows(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
    mapping: &LetterboxMapping,
) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 || data.len() < num_dets * num_feats {
        return Ok(Vec::new());
    }

    let feature = |det: usize, feat: usize| -> f64 {
        let idx = if transposed {
            feat * num_dets + det
        } else {
            det * num_feats + feat
        };
        data[idx] as f64
    };

    let mut detections = Vec::new();
    for i in 0..num_dets {
        let score = feature(i, 4);
        if score < confidence {
            continue;
        }
        let (cx, cy, w, h) = (feature(i, 0), feature(i, 1), feature(i, 2), feature(i, 3));
        let (x1, y1) = mapping.to_frame(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = mapping.to_frame(cx + w / 2.0, cy + h / 2.0);
        detections.push(RawDetection {
            bbox: [x1, y1, x2, y2],
            confidence: score,
        });
    }
    Ok(detections)
}

/// Greedy NMS: highest confidence first, drop boxes overlapping a kept one.
pub fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets.iter() {
        if keep.iter().all(|k| bbox_iou(&k.bbox, &det.bbox) <= iou_thresh) {
            keep.push(det.clone());
        }
    }
    keep
}

pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const IDENTITY: LetterboxMapping = LetterboxMapping {
        scale: 1.0,
        pad_x: 0,
        pad_y: 0,
    };

    fn det(bbox: [f64; 4], confidence: f64) -> RawDetection {
        RawDetection { bbox, confidence }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → 640: scale 3.2, content 640x320, 160px bands top and bottom.
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let lb = letterbox(&frame, 640);

        assert_eq!(lb.tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.mapping.scale, 3.2, epsilon = 0.01);
        assert_eq!(lb.mapping.pad_x, 0);
        assert_eq!(lb.mapping.pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized_and_padded() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let lb = letterbox(&frame, 640);

        let y = lb.mapping.pad_y as usize + 1;
        assert_relative_eq!(lb.tensor[[0, 0, y, 1]], 1.0, epsilon = 0.01);
        assert_relative_eq!(lb.tensor[[0, 0, 0, 0]], PAD_VALUE, epsilon = 0.01);
    }

    #[test]
    fn test_mapping_inverts_letterbox() {
        let mapping = LetterboxMapping {
            scale: 2.0,
            pad_x: 0,
            pad_y: 40,
        };
        assert_eq!(mapping.to_frame(100.0, 140.0), (50.0, 50.0));
    }

    #[test]
    fn test_decode_rows_row_major() {
        // Two detections, 6 features each (box, score, one extra class).
        let data = [
            50.0, 50.0, 20.0, 20.0, 0.9, 0.1, //
            10.0, 10.0, 4.0, 4.0, 0.2, 0.8,
        ];
        let dets = decode_rows(&data, &[1, 2, 6], 0.5, &IDENTITY).unwrap();
        assert_eq!(dets, vec![det([40.0, 40.0, 60.0, 60.0], 0.9f32 as f64)]);
    }

    #[test]
    fn test_decode_rows_transposed() {
        // [1, 5 features, 3 detections]
        let data = [
            10.0, 20.0, 30.0, // cx
            10.0, 20.0, 30.0, // cy
            2.0, 2.0, 2.0, // w
            2.0, 2.0, 2.0, // h
            0.1, 0.7, 0.6, // score
        ];
        let dets = decode_rows(&data, &[1, 5, 3], 0.5, &IDENTITY).unwrap();
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].bbox, [19.0, 19.0, 21.0, 21.0]);
        assert_eq!(dets[1].bbox, [29.0, 29.0, 31.0, 31.0]);
    }

    #[test]
    fn test_decode_rows_rejects_bad_rank() {
        assert!(decode_rows(&[0.0; 4], &[4], 0.5, &IDENTITY).is_err());
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let mut dets = vec![
            det([0.0, 0.0, 100.0, 100.0], 0.8),
            det([5.0, 5.0, 105.0, 105.0], 0.9),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping() {
        let mut dets = vec![
            det([0.0, 0.0, 50.0, 50.0], 0.9),
            det([200.0, 200.0, 250.0, 250.0], 0.8),
        ];
        assert_eq!(nms(&mut dets, 0.3).len(), 2);
        assert!(nms(&mut [], 0.3).is_empty());
    }

    #[test]
    fn test_bbox_iou() {
        let b = [0.0, 0.0, 10.0, 10.0];
        assert_relative_eq!(bbox_iou(&b, &b), 1.0);
        assert_eq!(bbox_iou(&b, &[20.0, 20.0, 30.0, 30.0]), 0.0);
        assert_relative_eq!(bbox_iou(&b, &[5.0, 0.0, 15.0, 10.0]), 50.0 / 150.0);
    }
}
