//! Finds known people in a video by matching sampled-frame face embeddings
//! against a gallery of reference embeddings.

pub mod shared {
    pub mod constants;
    pub mod embedding;
    pub mod frame;
    pub mod model_resolver;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod image_reader;
        pub mod video_reader;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod detected_face;
        pub mod face_embedder;
        pub mod person_detector;
    }
    pub mod infrastructure;
}

pub mod gallery {
    pub mod domain {
        pub mod gallery;
        pub mod gallery_builder;
        pub mod reference_entry;
    }
    pub mod infrastructure {
        pub mod reference_dir;
        pub mod reference_manifest;
    }
}

pub mod matching {
    pub mod similarity_matcher;
}

pub mod scanning {
    pub mod scan_observer;
    pub mod scan_settings;
    pub mod video_scanner;
}

pub mod aggregation {
    pub mod result_aggregator;
    pub mod sighting;
}

pub mod report {
    pub mod csv_report;
    pub mod json_report;
}

pub mod pipeline {
    pub mod enroll_reference_use_case;
    pub mod errors;
    pub mod identify_people_use_case;
}

#[cfg(test)]
pub(crate) mod testing;
