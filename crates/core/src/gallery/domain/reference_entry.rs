use std::path::PathBuf;

/// A named reference face supplied for one gallery build.
///
/// When both sources are present the precomputed embedding wins and the
/// image is never decoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceEntry {
    pub name: String,
    pub embedding: Option<Vec<f32>>,
    pub image_path: Option<PathBuf>,
}

impl ReferenceEntry {
    pub fn from_embedding(name: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            embedding: Some(embedding),
            image_path: None,
        }
    }

    pub fn from_image(name: impl Into<String>, image_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            embedding: None,
            image_path: Some(image_path.into()),
        }
    }

    /// Parses the CLI form `NAME=IMAGE_PATH`.
    pub fn parse_pair(pair: &str) -> Result<Self, String> {
        let (name, path) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=IMAGE, got '{pair}'"))?;
        let name = name.trim();
        if name.is_empty() || path.trim().is_empty() {
            return Err(format!("expected NAME=IMAGE, got '{pair}'"));
        }
        Ok(Self::from_image(name, path.trim()))
    }
}
