use std::path::Path;

use crate::aggregation::result_aggregator::{ProcessingResult, ResultAggregator};
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::gallery::domain::gallery_builder::GalleryBuilder;
use crate::gallery::domain::reference_entry::ReferenceEntry;
use crate::pipeline::errors::ScanError;
use crate::scanning::scan_observer::ScanObserver;
use crate::scanning::scan_settings::ScanSettings;
use crate::scanning::video_scanner::VideoScanner;
use crate::video::domain::video_reader::VideoReader;

/// Video identification pipeline: validate → build gallery → scan →
/// aggregate first sightings.
///
/// The embedder is borrowed per call so one loaded model pair can serve many
/// invocations.
pub struct IdentifyPeopleUseCase {
    reader: Box<dyn VideoReader>,
    observer: Box<dyn ScanObserver>,
    settings: ScanSettings,
}

impl IdentifyPeopleUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        observer: Box<dyn ScanObserver>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            reader,
            observer,
            settings,
        }
    }

    pub fn execute(
        &mut self,
        video_path: &Path,
        references: &[ReferenceEntry],
        embedder: &mut dyn FaceEmbedder,
    ) -> Result<ProcessingResult, ScanError> {
        self.settings.validate()?;
        if !video_path.is_file() {
            return Err(ScanError::InvalidInput(format!(
                "video file not found: {}",
                video_path.display()
            )));
        }
        if !embedder.is_available() {
            return Err(ScanError::ModelUnavailable);
        }

        let gallery = GalleryBuilder::new(embedder).build(references);
        if gallery.is_empty() {
            log::warn!("No usable reference faces; skipping scan");
            return Ok(Vec::new());
        }
        log::info!(
            "Gallery: {} reference(s) for {} people",
            gallery.len(),
            gallery.identity_count()
        );

        let mut aggregator = ResultAggregator::new();
        let stats = VideoScanner::new(self.settings).scan(
            self.reader.as_mut(),
            video_path,
            embedder,
            &gallery,
            self.observer.as_mut(),
            &mut |sighting| {
                let name = sighting.name.clone();
                let at = sighting.timestamp;
                if aggregator.record(sighting) {
                    log::info!("First sighting: {name} at {at:.2}s");
                }
            },
        )?;
        self.observer.summary();

        let rows = aggregator.finish();
        log::info!(
            "Identified {} people in {} sampled frames",
            rows.len(),
            stats.frames_sampled
        );
        Ok(rows)
    }
}
