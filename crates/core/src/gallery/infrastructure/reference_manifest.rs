//! JSON file listing known people and their reference faces.
//!
//! ```json
//! {
//!   "people": [
//!     {
//!       "name": "Ada",
//!       "metadata": { "team": "analytics" },
//!       "references": [
//!         { "image": "ada/front.jpg", "embedding": [0.01, -0.2, ...] },
//!         { "image": "ada/side.jpg" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Relative image paths are resolved against the manifest's directory.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gallery::domain::reference_entry::ReferenceEntry;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("person '{0}' appears more than once")]
    DuplicatePerson(String),
    #[error("person '{0}' not found")]
    UnknownPerson(String),
    #[error("person name must not be empty")]
    EmptyName,
    #[error("no face detected in reference image {0}")]
    NoFace(PathBuf),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceManifest {
    #[serde(default)]
    pub people: Vec<PersonRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub references: Vec<ReferenceRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl ReferenceManifest {
    /// Loads a manifest; a missing file is an empty manifest.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Self = serde_json::from_str(&text).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Writes the manifest atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let write_err = |source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let temp_path = path.with_extension("json.part");
        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.write_all(b"\n").map_err(write_err)?;
        file.flush().map_err(write_err)?;
        drop(file);
        fs::rename(&temp_path, path).map_err(write_err)
    }

    fn validate(&self) -> Result<(), ManifestError> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.people.len());
        for person in &self.people {
            if seen.contains(&person.name.as_str()) {
                return Err(ManifestError::DuplicatePerson(person.name.clone()));
            }
            seen.push(&person.name);
        }
        Ok(())
    }

    pub fn person(&self, name: &str) -> Option<&PersonRecord> {
        self.people.iter().find(|p| p.name == name)
    }

    /// Appends a reference to `name`, creating the person if needed.
    ///
    /// Metadata, when given, replaces the person's existing metadata.
    pub fn add_reference(
        &mut self,
        name: &str,
        reference: ReferenceRecord,
        metadata: Option<serde_json::Value>,
    ) -> Result<(), ManifestError> {
        if name.trim().is_empty() {
            return Err(ManifestError::EmptyName);
        }
        match self.people.iter_mut().find(|p| p.name == name) {
            Some(person) => {
                if metadata.is_some() {
                    person.metadata = metadata;
                }
                person.references.push(reference);
            }
            None => self.people.push(PersonRecord {
                name: name.to_string(),
                metadata,
                references: vec![reference],
            }),
        }
        Ok(())
    }

    /// Removes a person and all of their references.
    pub fn remove_person(&mut self, name: &str) -> Result<PersonRecord, ManifestError> {
        let index = self
            .people
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ManifestError::UnknownPerson(name.to_string()))?;
        Ok(self.people.remove(index))
    }

    /// Flattens to gallery input in file order, resolving image paths
    /// relative to `base_dir`.
    pub fn to_entries(&self, base_dir: &Path) -> Vec<ReferenceEntry> {
        self.people
            .iter()
            .flat_map(|person| {
                person.references.iter().map(move |r| ReferenceEntry {
                    name: person.name.clone(),
                    embedding: r.embedding.clone(),
                    image_path: r.image.as_ref().map(|p| base_dir.join(p)),
                })
            })
            .collect()
    }
}
