//! Annotation documents with label extraction and atomic `imagePath` rewriting
//!
//! Only two fields are interpreted: the `shapes` list (for labels) and the
//! top-level `imagePath`. Everything else is carried through untouched, in
//! its original key order.

use crate::io::configuration::{IMAGE_PATH_FIELD, LABEL_FIELD, SHAPES_FIELD};
use crate::io::error::{ReplicationError, Result, WithPath, malformed_annotation};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A parsed annotation file
#[derive(Debug, Clone)]
pub struct AnnotationDocument {
    path: PathBuf,
    fields: Map<String, Value>,
}

impl AnnotationDocument {
    /// Read and parse the annotation at `path`
    ///
    /// # Errors
    ///
    /// Returns a parse-category error if the file cannot be read, is not valid
    /// JSON, or is not a JSON object with an optional `shapes` list
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| ReplicationError::AnnotationRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(path, &bytes)
    }

    /// Parse annotation content already in memory
    ///
    /// # Errors
    ///
    /// Returns a parse-category error if `bytes` is not a JSON object or its
    /// `shapes` field is present but not a list
    pub fn from_slice(path: &Path, bytes: &[u8]) -> Result<Self> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|source| ReplicationError::AnnotationParse {
                path: path.to_path_buf(),
                source,
            })?;

        let Value::Object(fields) = value else {
            return Err(malformed_annotation(path, &"top-level value is not an object"));
        };

        match fields.get(SHAPES_FIELD) {
            None | Some(Value::Null | Value::Array(_)) => {}
            Some(_) => {
                return Err(malformed_annotation(
                    path,
                    &format!("'{SHAPES_FIELD}' is not a list"),
                ));
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            fields,
        })
    }

    /// Path the document was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current `imagePath` value, if it is a string
    pub fn image_path(&self) -> Option<&str> {
        self.fields.get(IMAGE_PATH_FIELD).and_then(Value::as_str)
    }

    /// Count shape instances per label, trimmed of surrounding whitespace
    ///
    /// Labels that are blank after trimming are ignored.
    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        let shapes = self
            .fields
            .get(SHAPES_FIELD)
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice);

        for label in shapes
            .iter()
            .filter_map(|shape| shape.get(LABEL_FIELD).and_then(Value::as_str))
            .map(str::trim)
            .filter(|label| !label.is_empty())
        {
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }

        counts
    }

    /// Write a copy of this document to `destination` with `imagePath` set to `image_name`
    ///
    /// The copy is staged in the destination directory and renamed into place,
    /// so readers never observe a half-written file. An existing file at
    /// `destination` is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging file cannot be created or written, or
    /// the final rename fails
    pub fn write_replica(&self, destination: &Path, image_name: &str) -> Result<()> {
        let mut patched = self.fields.clone();
        patched.insert(
            IMAGE_PATH_FIELD.to_string(),
            Value::String(image_name.to_string()),
        );

        let directory = destination
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged =
            NamedTempFile::new_in(directory).with_path(directory, "create staging file")?;

        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &patched).map_err(|source| {
                ReplicationError::AnnotationWrite {
                    path: destination.to_path_buf(),
                    source,
                }
            })?;
            writer
                .flush()
                .with_path(destination, "write annotation")?;
        }

        staged
            .persist(destination)
            .map_err(|e| e.error)
            .with_path(destination, "replace annotation")?;

        Ok(())
    }
}
