use crate::gallery::domain::gallery::{Gallery, GalleryItem};
use crate::shared::embedding::Embedding;

/// Best gallery item for one probe embedding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult<'g> {
    pub item: &'g GalleryItem,
    /// Raw cosine similarity.
    pub score: f64,
}

impl MatchResult<'_> {
    pub fn confidence(&self) -> f64 {
        confidence_from_similarity(self.score)
    }
}

/// Nearest-neighbour search by cosine similarity over a [`Gallery`].
pub struct SimilarityMatcher;

impl SimilarityMatcher {
    /// Linear scan for the highest-similarity item. The earliest item wins
    /// ties. Items of a different dimension than the probe are skipped.
    /// Returns `None` when nothing is comparable.
    pub fn best_match<'g>(probe: &Embedding, gallery: &'g Gallery) -> Option<MatchResult<'g>> {
        let mut best: Option<MatchResult<'g>> = None;
        for item in gallery.items() {
            if item.embedding.dim() != probe.dim() {
                continue;
            }
            let score = probe.cosine_similarity(&item.embedding);
            if best.map_or(true, |b| score > b.score) {
                best = Some(MatchResult { item, score });
            }
        }
        best
    }
}

/// Maps cosine similarity in [-1, 1] onto a [0, 1] confidence.
pub fn confidence_from_similarity(score: f64) -> f64 {
    (score + 1.0) / 2.0
}
