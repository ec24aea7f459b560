use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::aggregation::sighting::Sighting;

/// Receives scan events so callers can report progress without the
/// scanner knowing where the output goes.
pub trait ScanObserver {
    /// A frame was selected for detection. `total` is the container's frame
    /// count and may be 0 when unknown.
    fn frame_sampled(&mut self, frame_index: usize, total: usize);

    fn faces_detected(&mut self, frame_index: usize, count: usize);

    fn sighting_accepted(&mut self, sighting: &Sighting);

    /// A face matched someone but fell below the confidence threshold.
    fn sighting_ignored(&mut self, name: &str, confidence: f64, frame_index: usize);

    /// Duration of one stage (e.g. "detect") for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    fn summary(&self) {}
}

/// Discards every event.
pub struct NullScanObserver;

impl ScanObserver for NullScanObserver {
    fn frame_sampled(&mut self, _frame_index: usize, _total: usize) {}
    fn faces_detected(&mut self, _frame_index: usize, _count: usize) {}
    fn sighting_accepted(&mut self, _sighting: &Sighting) {}
    fn sighting_ignored(&mut self, _name: &str, _confidence: f64, _frame_index: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
}

/// Writes progress and a closing summary through the `log` facade.
///
/// Progress lines are throttled to one every `throttle_samples` sampled
/// frames. The clock starts at the first sampled frame, so the summary's
/// total covers the scan only.
pub struct LoggingScanObserver {
    throttle_samples: usize,
    timings: HashMap<String, Vec<f64>>,
    start_time: Option<Instant>,
    sampled_frames: usize,
    faces: usize,
    accepted: usize,
    ignored: usize,
}

impl LoggingScanObserver {
    pub fn new(throttle_samples: usize) -> Self {
        Self {
            throttle_samples: throttle_samples.max(1),
            timings: HashMap::new(),
            start_time: None,
            sampled_frames: 0,
            faces: 0,
            accepted: 0,
            ignored: 0,
        }
    }

    /// Returns the formatted summary, or `None` before any frame was sampled.
    pub fn summary_string(&self) -> Option<String> {
        if self.sampled_frames == 0 {
            return None;
        }

        let elapsed_ms = self.elapsed().unwrap_or_default().as_secs_f64() * 1000.0;
        let mut lines = vec![
            format!(
                "Scan summary ({} sampled frames, {:.1}s total):",
                self.sampled_frames,
                elapsed_ms / 1000.0
            ),
            format!(
                "  faces: {}  sightings: {}  below threshold: {}",
                self.faces, self.accepted, self.ignored
            ),
        ];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms"
            ));
        }

        Some(lines.join("\n"))
    }

    /// Time since the first sampled frame.
    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|t| t.elapsed())
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }
}

impl Default for LoggingScanObserver {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ScanObserver for LoggingScanObserver {
    fn frame_sampled(&mut self, frame_index: usize, total: usize) {
        self.start_time.get_or_insert_with(Instant::now);
        self.sampled_frames += 1;
        if self.sampled_frames % self.throttle_samples != 0 {
            return;
        }
        if total > 0 {
            let pct = (frame_index + 1) as f64 / total as f64 * 100.0;
            log::info!("Scanning: frame {frame_index}/{total} ({pct:.1}%)");
        } else {
            log::info!("Scanning: frame {frame_index}");
        }
    }

    fn faces_detected(&mut self, frame_index: usize, count: usize) {
        self.faces += count;
        if count > 0 {
            log::debug!("Frame {frame_index}: {count} face(s)");
        }
    }

    fn sighting_accepted(&mut self, sighting: &Sighting) {
        self.accepted += 1;
        log::debug!(
            "Frame {}: {} ({:.3}) at {:.2}s",
            sighting.frame_index,
            sighting.name,
            sighting.confidence,
            sighting.timestamp
        );
    }

    fn sighting_ignored(&mut self, name: &str, confidence: f64, frame_index: usize) {
        self.ignored += 1;
        log::trace!("Frame {frame_index}: {name} below threshold ({confidence:.3})");
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
