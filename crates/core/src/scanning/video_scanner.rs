use std::path::Path;
use std::time::Instant;

use crate::aggregation::sighting::Sighting;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::gallery::domain::gallery::Gallery;
use crate::matching::similarity_matcher::SimilarityMatcher;
use crate::pipeline::errors::ScanError;
use crate::video::domain::video_reader::VideoReader;

use super::scan_observer::ScanObserver;
use super::scan_settings::ScanSettings;

/// Counters from a completed scan.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScanStats {
    pub fps: f64,
    pub stride: usize,
    pub frames_read: usize,
    pub frames_sampled: usize,
    pub sightings: usize,
}

/// Samples frames at a fixed time interval and emits a [`Sighting`] for
/// every face whose best gallery match clears the confidence threshold.
pub struct VideoScanner {
    settings: ScanSettings,
}

/// Closes the reader when dropped, whichever way the scan ends.
struct OpenReader<'r> {
    reader: &'r mut dyn VideoReader,
}

impl Drop for OpenReader<'_> {
    fn drop(&mut self) {
        self.reader.close();
    }
}

impl VideoScanner {
    pub fn new(settings: ScanSettings) -> Self {
        Self { settings }
    }

    pub fn scan(
        &self,
        reader: &mut dyn VideoReader,
        path: &Path,
        embedder: &mut dyn FaceEmbedder,
        gallery: &Gallery,
        observer: &mut dyn ScanObserver,
        on_sighting: &mut dyn FnMut(Sighting),
    ) -> Result<ScanStats, ScanError> {
        if !embedder.is_available() {
            return Err(ScanError::ModelUnavailable);
        }

        let metadata = reader
            .open(path)
            .map_err(|source| ScanError::SourceUnopenable {
                path: path.to_path_buf(),
                source,
            })?;
        let guard = OpenReader { reader };

        let fps = metadata.effective_fps();
        let stride = self.settings.stride(fps);
        log::info!(
            "Scanning {} ({}x{}, {:.2} fps, every {stride} frame(s))",
            path.display(),
            metadata.width,
            metadata.height,
            fps
        );

        let mut stats = ScanStats {
            fps,
            stride,
            ..ScanStats::default()
        };

        for (frame_index, frame) in guard.reader.frames().enumerate() {
            let frame = frame.map_err(ScanError::Decode)?;
            stats.frames_read += 1;
            if frame_index % stride != 0 {
                continue;
            }
            stats.frames_sampled += 1;
            observer.frame_sampled(frame_index, metadata.total_frames);

            let t0 = Instant::now();
            let faces = embedder.detect(&frame).map_err(ScanError::Detection)?;
            observer.timing("detect", t0.elapsed().as_secs_f64() * 1000.0);
            observer.faces_detected(frame_index, faces.len());

            let timestamp = frame_index as f64 / fps;
            let t0 = Instant::now();
            for face in &faces {
                let Some(embedding) = face.embedding.as_ref() else {
                    continue;
                };
                let Some(best) = SimilarityMatcher::best_match(embedding, gallery) else {
                    continue;
                };
                let confidence = best.confidence();
                if confidence < self.settings.min_confidence {
                    observer.sighting_ignored(&best.item.name, confidence, frame_index);
                    continue;
                }
                let sighting = Sighting {
                    name: best.item.name.clone(),
                    confidence,
                    timestamp,
                    frame_index,
                };
                observer.sighting_accepted(&sighting);
                stats.sightings += 1;
                on_sighting(sighting);
            }
            observer.timing("match", t0.elapsed().as_secs_f64() * 1000.0);
        }

        log::debug!(
            "Scan finished: {} frames read, {} sampled, {} sightings",
            stats.frames_read,
            stats.frames_sampled,
            stats.sightings
        );
        Ok(stats)
    }
}
