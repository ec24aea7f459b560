use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::shared::embedding::Embedding;

use super::gallery::{Gallery, GalleryItem};
use super::reference_entry::ReferenceEntry;

/// Turns reference entries into a [`Gallery`], preserving input order.
///
/// Entries that cannot produce an embedding are dropped with a warning;
/// a partial gallery is a normal outcome (e.g. a reference photo with no
/// detectable face). Model-computed embeddings fix the dimension when there
/// are any, otherwise the first stored one does. Entries of any other
/// dimension are dropped.
pub struct GalleryBuilder<'a> {
    embedder: &'a mut dyn FaceEmbedder,
}

impl<'a> GalleryBuilder<'a> {
    pub fn new(embedder: &'a mut dyn FaceEmbedder) -> Self {
        Self { embedder }
    }

    pub fn build(&mut self, entries: &[ReferenceEntry]) -> Gallery {
        let mut candidates: Vec<(GalleryItem, bool)> = Vec::with_capacity(entries.len());

        for entry in entries {
            let name = entry.name.as_str();
            if name.trim().is_empty() {
                log::warn!("Skipping reference with empty name");
                continue;
            }
            let Some((embedding, from_model)) = self.embedding_for(entry) else {
                continue;
            };
            candidates.push((GalleryItem::new(name, embedding), from_model));
        }

        let Some(dim) = gallery_dim(&candidates) else {
            log::debug!("Gallery built: 0 of {} references usable", entries.len());
            return Gallery::new(Vec::new());
        };
        let items: Vec<GalleryItem> = candidates
            .into_iter()
            .filter_map(|(item, _)| {
                if item.embedding.dim() == dim {
                    return Some(item);
                }
                log::error!(
                    "Skipping reference for '{}': embedding has {} dimensions, gallery uses {dim}",
                    item.name,
                    item.embedding.dim()
                );
                None
            })
            .collect();

        log::debug!(
            "Gallery built: {} of {} references usable",
            items.len(),
            entries.len()
        );
        Gallery::new(items)
    }

    /// Returns the embedding and whether the model computed it.
    fn embedding_for(&mut self, entry: &ReferenceEntry) -> Option<(Embedding, bool)> {
        if let Some(values) = entry.embedding.as_ref().filter(|v| !v.is_empty()) {
            return Some((Embedding::new(values.clone()), false));
        }

        let path = entry.image_path.as_deref()?;
        match self.embedder.best_embedding(path) {
            Ok(Some(embedding)) if !embedding.is_empty() => Some((embedding, true)),
            Ok(_) => {
                log::warn!(
                    "No face detected in reference image {} for '{}'",
                    path.display(),
                    entry.name
                );
                None
            }
            Err(e) => {
                log::warn!(
                    "Could not embed reference image {} for '{}': {e}",
                    path.display(),
                    entry.name
                );
                None
            }
        }
    }
}

/// The model's own dimension when any reference was embedded by it,
/// otherwise that of the first stored embedding.
fn gallery_dim(candidates: &[(GalleryItem, bool)]) -> Option<usize> {
    candidates
        .iter()
        .find(|(_, from_model)| *from_model)
        .or_else(|| candidates.first())
        .map(|(item, _)| item.embedding.dim())
}
