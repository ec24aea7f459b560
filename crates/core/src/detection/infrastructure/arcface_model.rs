//! ArcFace (w600k_r50) embedding model.
//!
//! Input is a 112x112 RGB face crop normalized to [-1, 1]; output is a
//! 512-d vector that is L2-normalized before use.
use std::path::Path;

use crate::shared::embedding::{l2_normalize, Embedding};
use crate::shared::frame::Frame;

use super::onnx_session::load_session;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct ArcFaceModel {
    session: ort::session::Session,
}

impl ArcFaceModel {
    pub fn load(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        log::debug!("Loaded embedding model {}", model_path.display());
        Ok(Self { session })
    }

    pub fn embed(&mut self, crop: &Frame) -> Result<Embedding, Box<dyn std::error::Error>> {
        let tensor = preprocess(crop);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let mut embedding = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?
            .to_vec();
        l2_normalize(&mut embedding);
        Ok(Embedding::new(embedding))
    }
}

/// Nearest-neighbour resize to 112x112, normalize, NCHW layout.
fn preprocess(crop: &Frame) -> ndarray::Array4<f32> {
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;
    let src = crop.as_ndarray();

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    if src_w == 0 || src_h == 0 {
        return tensor;
    }

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[src_y, src_x, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn flat_crop(size: u32, value: u8) -> Frame {
        Frame::new(vec![value; (size * size * 3) as usize], size, size, 3, 0)
    }

    #[test]
    fn test_preprocess_shape() {
        let tensor = preprocess(&flat_crop(50, 128));
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[rstest]
    #[case(0, -1.0)]
    #[case(127, (127.0 - 127.5) / 127.5)]
    #[case(255, 1.0)]
    fn test_preprocess_normalization(#[case] value: u8, #[case] expected: f32) {
        let tensor = preprocess(&flat_crop(10, value));
        assert_relative_eq!(tensor[[0, 0, 0, 0]], expected, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 2, 111, 111]], expected, epsilon = 0.01);
    }

    #[test]
    fn test_preprocess_keeps_channel_order() {
        let mut data = Vec::new();
        for _ in 0..4 {
            data.extend_from_slice(&[255, 0, 127]);
        }
        let tensor = preprocess(&Frame::new(data, 2, 2, 3, 0));
        assert_relative_eq!(tensor[[0, 0, 5, 5]], 1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 1, 5, 5]], -1.0, epsilon = 0.01);
    }
}
