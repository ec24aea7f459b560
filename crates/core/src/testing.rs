//! Stub capabilities shared by unit tests.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Per-image outcome for [`StubFaceEmbedder::best_embedding`].
pub enum StubImage {
    Face(Vec<f32>),
    NoFace,
    Unreadable,
}

/// Scripted embedder: faces keyed by frame index, embeddings keyed by path.
pub struct StubFaceEmbedder {
    pub available: bool,
    pub faces_by_frame: HashMap<usize, Vec<DetectedFace>>,
    pub images: HashMap<PathBuf, StubImage>,
    pub detect_calls: Arc<Mutex<Vec<usize>>>,
    pub image_calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl StubFaceEmbedder {
    pub fn new() -> Self {
        Self {
            available: true,
            faces_by_frame: HashMap::new(),
            images: HashMap::new(),
            detect_calls: Arc::new(Mutex::new(Vec::new())),
            image_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn with_face(mut self, frame_index: usize, embedding: Vec<f32>) -> Self {
        self.faces_by_frame
            .entry(frame_index)
            .or_default()
            .push(face(0.9, Some(embedding)));
        self
    }

    pub fn with_faceless_detection(mut self, frame_index: usize) -> Self {
        self.faces_by_frame
            .entry(frame_index)
            .or_default()
            .push(face(0.9, None));
        self
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>, image: StubImage) -> Self {
        self.images.insert(path.into(), image);
        self
    }
}

pub fn face(confidence: f64, embedding: Option<Vec<f32>>) -> DetectedFace {
    DetectedFace {
        confidence,
        bbox: [0.0, 0.0, 10.0, 10.0],
        embedding: embedding.map(Embedding::new),
    }
}

impl FaceEmbedder for StubFaceEmbedder {
    fn is_available(&self) -> bool {
        self.available
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        self.detect_calls.lock().unwrap().push(frame.index());
        Ok(self
            .faces_by_frame
            .get(&frame.index())
            .cloned()
            .unwrap_or_default())
    }

    fn best_embedding(
        &mut self,
        image_path: &Path,
    ) -> Result<Option<Embedding>, Box<dyn std::error::Error>> {
        self.image_calls
            .lock()
            .unwrap()
            .push(image_path.to_path_buf());
        match self.images.get(image_path) {
            Some(StubImage::Face(v)) => Ok(Some(Embedding::new(v.clone()))),
            Some(StubImage::NoFace) => Ok(None),
            Some(StubImage::Unreadable) | None => {
                Err(format!("cannot read {}", image_path.display()).into())
            }
        }
    }
}

/// In-memory video: `frame_count` blank frames at `fps`.
pub struct StubReader {
    pub fps: f64,
    pub frame_count: usize,
    pub fail_open: bool,
    /// Yield a decode error instead of the frame at this index.
    pub fail_at: Option<usize>,
    pub closed: Arc<Mutex<usize>>,
}

impl StubReader {
    pub fn new(frame_count: usize, fps: f64) -> Self {
        Self {
            fps,
            frame_count,
            fail_open: false,
            fail_at: None,
            closed: Arc::new(Mutex::new(0)),
        }
    }
}

impl VideoReader for StubReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        if self.fail_open {
            return Err("moov atom not found".into());
        }
        Ok(VideoMetadata {
            width: 4,
            height: 4,
            fps: self.fps,
            total_frames: self.frame_count,
            codec: "stub".to_string(),
            source_path: Some(path.to_path_buf()),
        })
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let fail_at = self.fail_at;
        Box::new((0..self.frame_count).map(move |i| -> Result<Frame, Box<dyn std::error::Error>> {
            if Some(i) == fail_at {
                Err("corrupt packet".into())
            } else {
                Ok(Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 3, i))
            }
        }))
    }

    fn close(&mut self) {
        *self.closed.lock().unwrap() += 1;
    }
}
