//! COCO style dataset manifests.
//!
//! Only the `images` array is read. Every record counts towards the dataset
//! size, including records without a usable `file_name`, so a partially broken
//! manifest shows up in the final report instead of being silently shortened.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::DatasetError;

/// One image record of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// The `id` of the record, if it has an integer one.
    pub id: Option<u64>,
    /// The `file_name` of the record, relative to the source directory.
    pub file_name: Option<String>,
}

impl ManifestEntry {
    fn from_record(record: &Value) -> Self {
        Self {
            id: record.get("id").and_then(Value::as_u64),
            file_name: record
                .get("file_name")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }
}

#[derive(Deserialize)]
struct Document {
    images: Vec<Value>,
}

/// The ordered list of images to process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Create a manifest from entries.
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// [`DatasetError::ManifestUnreadable`] if the file cannot be read and
    /// [`DatasetError::ManifestMalformed`] if it is not a valid manifest.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| {
            DatasetError::ManifestUnreadable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let manifest = Self::from_json_str(&json)?;
        log::debug!(
            "loaded {} records from {}",
            manifest.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Parse a manifest from a JSON string.
    ///
    /// # Example
    ///
    /// ```
    /// use despeckle_dataset::manifest::Manifest;
    ///
    /// let manifest = Manifest::from_json_str(
    ///     r#"{"images": [{"id": 0, "file_name": "a.jpg"}, {"id": 1}]}"#,
    /// ).unwrap();
    ///
    /// assert_eq!(manifest.len(), 2);
    /// assert_eq!(manifest.entries()[0].file_name.as_deref(), Some("a.jpg"));
    /// assert_eq!(manifest.entries()[1].file_name, None);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let document: Document = serde_json::from_str(json)
            .map_err(|e| DatasetError::ManifestMalformed(e.to_string()))?;

        Ok(Self {
            entries: document
                .images
                .iter()
                .map(ManifestEntry::from_record)
                .collect(),
        })
    }

    /// The records in manifest order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Iterate over the records in manifest order.
    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest lists no images.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_coco_images() -> Result<(), DatasetError> {
        let json = r#"{
            "info": {"description": "sar"},
            "images": [
                {"id": 0, "file_name": "a.jpg", "width": 640, "height": 640},
                {"id": 1, "file_name": "sub/b.png"},
                {"id": 2, "file_name": 42},
                {"file_name": "c.jpg"}
            ],
            "annotations": []
        }"#;

        let manifest = Manifest::from_json_str(json)?;
        assert_eq!(manifest.len(), 4);
        assert_eq!(
            manifest.entries(),
            &[
                ManifestEntry {
                    id: Some(0),
                    file_name: Some("a.jpg".to_string())
                },
                ManifestEntry {
                    id: Some(1),
                    file_name: Some("sub/b.png".to_string())
                },
                ManifestEntry {
                    id: Some(2),
                    file_name: None
                },
                ManifestEntry {
                    id: None,
                    file_name: Some("c.jpg".to_string())
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn empty_is_not_malformed() -> Result<(), DatasetError> {
        let manifest = Manifest::from_json_str(r#"{"images": []}"#)?;
        assert!(manifest.is_empty());
        Ok(())
    }

    #[test]
    fn malformed_documents() {
        for json in [
            "",
            "{",
            "[]",
            r#"{"annotations": []}"#,
            r#"{"images": {"file_name": "a.jpg"}}"#,
            r#"{"images": "a.jpg"}"#,
        ] {
            let res = Manifest::from_json_str(json);
            assert!(
                matches!(res, Err(DatasetError::ManifestMalformed(_))),
                "{json:?} should be malformed"
            );
        }
    }

    #[test]
    fn load_missing_file() {
        let res = Manifest::load("does/not/exist.json");
        assert!(matches!(res, Err(DatasetError::ManifestUnreadable { .. })));
    }

    #[test]
    fn load_file() -> Result<(), Box<dyn std::error::Error>> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("_annotations.coco.json");
        std::fs::write(&path, r#"{"images": [{"id": 3, "file_name": "x.jpg"}]}"#)?;

        let manifest = Manifest::load(&path)?;
        let names = manifest
            .iter()
            .filter_map(|e| e.file_name.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["x.jpg"]);
        Ok(())
    }
}
