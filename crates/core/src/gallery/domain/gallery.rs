use crate::shared::embedding::Embedding;

#[derive(Clone, Debug, PartialEq)]
pub struct GalleryItem {
    pub name: String,
    pub embedding: Embedding,
}

impl GalleryItem {
    pub fn new(name: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            name: name.into(),
            embedding,
        }
    }
}

/// Ordered reference embeddings for one processing run.
///
/// Names may repeat (several photos of one person); each item is matched
/// independently. Built once, then only read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gallery {
    items: Vec<GalleryItem>,
}

impl Gallery {
    pub fn new(items: Vec<GalleryItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct identity names.
    pub fn identity_count(&self) -> usize {
        let mut names: Vec<&str> = self.items.iter().map(|i| i.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names.len()
    }
}
