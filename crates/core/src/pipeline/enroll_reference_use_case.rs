use std::path::Path;

use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::gallery::infrastructure::reference_manifest::{
    ManifestError, ReferenceManifest, ReferenceRecord,
};
use crate::pipeline::errors::ScanError;

/// Adds a reference photo to a manifest, storing its embedding so later
/// scans do not re-run detection on it.
///
/// The manifest file is only rewritten once the embedding succeeded.
pub struct EnrollReferenceUseCase {
    manifest_path: std::path::PathBuf,
}

impl EnrollReferenceUseCase {
    pub fn new(manifest_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
        }
    }

    pub fn execute(
        &self,
        embedder: &mut dyn FaceEmbedder,
        name: &str,
        image_path: &Path,
        metadata: Option<serde_json::Value>,
    ) -> Result<ReferenceRecord, Box<dyn std::error::Error>> {
        let mut manifest = ReferenceManifest::load(&self.manifest_path)?;
        if name.trim().is_empty() {
            return Err(ManifestError::EmptyName.into());
        }
        if !image_path.is_file() {
            return Err(ScanError::InvalidInput(format!(
                "reference image not found: {}",
                image_path.display()
            ))
            .into());
        }
        if !embedder.is_available() {
            return Err(ScanError::ModelUnavailable.into());
        }

        let embedding = embedder
            .best_embedding(image_path)?
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ManifestError::NoFace(image_path.to_path_buf()))?;

        // Stored absolute: relative entries resolve against the manifest's
        // directory, not the caller's working directory.
        let image = std::fs::canonicalize(image_path)?;
        let record = ReferenceRecord {
            image: Some(image),
            embedding: Some(embedding.into_vec()),
        };
        manifest.add_reference(name, record.clone(), metadata)?;
        manifest.save(&self.manifest_path)?;

        log::info!(
            "Enrolled reference for '{name}' ({} total)",
            manifest
                .person(name)
                .map(|p| p.references.len())
                .unwrap_or_default()
        );
        Ok(record)
    }
}
