//! On-disk OCI image layout writer
//!
//! Layout structure:
//! ```text
//! layout/
//!   oci-layout             // {"imageLayoutVersion":"1.0.0"}
//!   index.json             // top-level image index
//!   blobs/sha256/{digest}  // content-addressed blobs
//! ```

use crate::error::{PackerError, Result};
use crate::oci::{Descriptor, ImageIndex, REF_NAME_ANNOTATION, media_types};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const OCI_LAYOUT_FILE: &str = "oci-layout";
pub const INDEX_FILE: &str = "index.json";
pub const BLOBS_DIR: &str = "blobs";
pub const SHA256_PREFIX: &str = "sha256";

const IMAGE_LAYOUT_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize, Deserialize)]
struct LayoutMarker {
    #[serde(rename = "imageLayoutVersion")]
    image_layout_version: String,
}

/// Writes one OCI image layout directory; `finish` seals it with `index.json`
pub struct LayoutWriter {
    root: PathBuf,
    manifests: Vec<Descriptor>,
}

impl LayoutWriter {
    pub fn create(root: &Path) -> Result<Self> {
        let blob_dir = root.join(BLOBS_DIR).join(SHA256_PREFIX);
        fs::create_dir_all(&blob_dir).map_err(|e| {
            PackerError::Store(format!(
                "Failed to create layout directory {}: {}",
                blob_dir.display(),
                e
            ))
        })?;

        let marker = LayoutMarker {
            image_layout_version: IMAGE_LAYOUT_VERSION.to_string(),
        };
        let marker_path = root.join(OCI_LAYOUT_FILE);
        fs::write(&marker_path, serde_json::to_vec(&marker)?).map_err(|e| {
            PackerError::Store(format!(
                "Failed to write {}: {}",
                marker_path.display(),
                e
            ))
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            manifests: Vec::new(),
        })
    }

    /// Store a blob under its sha256 digest; duplicate content is a no-op
    pub fn add_blob(&self, data: &[u8]) -> Result<String> {
        let digest = format!("sha256:{}", hex::encode(Sha256::digest(data)));
        self.write_blob(&digest, data)?;
        Ok(digest)
    }

    /// Store a blob whose digest is already known and verified by the caller
    pub fn add_blob_with_digest(&self, digest: &str, data: &[u8]) -> Result<()> {
        self.write_blob(digest, data)
    }

    fn write_blob(&self, digest: &str, data: &[u8]) -> Result<()> {
        let hash = digest.strip_prefix("sha256:").ok_or_else(|| {
            PackerError::Store(format!("Unsupported blob digest '{}'", digest))
        })?;
        let blob_path = self.root.join(BLOBS_DIR).join(SHA256_PREFIX).join(hash);

        if blob_path.exists() {
            return Ok(());
        }

        fs::write(&blob_path, data).map_err(|e| {
            PackerError::Store(format!("Failed to write blob {}: {}", blob_path.display(), e))
        })
    }

    /// Store a manifest blob and record it in the index under `ref_name`
    pub fn add_manifest(&mut self, data: &[u8], media_type: &str, ref_name: &str) -> Result<String> {
        let digest = self.add_blob(data)?;

        let mut annotations = HashMap::new();
        annotations.insert(REF_NAME_ANNOTATION.to_string(), ref_name.to_string());

        self.manifests.push(Descriptor {
            media_type: media_type.to_string(),
            digest: digest.clone(),
            size: data.len() as u64,
            platform: None,
            annotations: Some(annotations),
        });

        Ok(digest)
    }

    /// Write `index.json`; valid with zero manifests
    pub fn finish(self) -> Result<()> {
        let index = ImageIndex {
            schema_version: 2,
            media_type: Some(media_types::OCI_INDEX.to_string()),
            manifests: self.manifests,
        };

        let index_path = self.root.join(INDEX_FILE);
        fs::write(&index_path, serde_json::to_vec_pretty(&index)?).map_err(|e| {
            PackerError::Store(format!("Failed to write {}: {}", index_path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_writes_layout_marker() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("layout");
        LayoutWriter::create(&root).unwrap();

        let marker: serde_json::Value =
            serde_json::from_slice(&fs::read(root.join(OCI_LAYOUT_FILE)).unwrap()).unwrap();
        assert_eq!(marker["imageLayoutVersion"], "1.0.0");
        assert!(root.join(BLOBS_DIR).join(SHA256_PREFIX).is_dir());
    }

    #[test]
    fn test_add_blob_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LayoutWriter::create(dir.path()).unwrap();

        let digest = writer.add_blob(b"layer data").unwrap();
        assert!(digest.starts_with("sha256:"));

        let hash = digest.strip_prefix("sha256:").unwrap();
        let blob_path = dir.path().join(BLOBS_DIR).join(SHA256_PREFIX).join(hash);
        assert_eq!(fs::read(&blob_path).unwrap(), b"layer data");

        // Same content stores once and yields the same digest
        assert_eq!(writer.add_blob(b"layer data").unwrap(), digest);
    }

    #[test]
    fn test_finish_writes_index_with_ref_annotation() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = LayoutWriter::create(dir.path()).unwrap();
        writer
            .add_manifest(
                b"{\"schemaVersion\":2}",
                media_types::OCI_MANIFEST,
                "docker.io/library/busybox:latest",
            )
            .unwrap();
        writer.finish().unwrap();

        let index: ImageIndex =
            serde_json::from_slice(&fs::read(dir.path().join(INDEX_FILE)).unwrap()).unwrap();
        assert_eq!(index.schema_version, 2);
        assert_eq!(index.manifests.len(), 1);
        let annotations = index.manifests[0].annotations.as_ref().unwrap();
        assert_eq!(
            annotations[REF_NAME_ANNOTATION],
            "docker.io/library/busybox:latest"
        );
    }

    #[test]
    fn test_empty_layout_index_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        LayoutWriter::create(dir.path()).unwrap().finish().unwrap();

        let index: ImageIndex =
            serde_json::from_slice(&fs::read(dir.path().join(INDEX_FILE)).unwrap()).unwrap();
        assert!(index.manifests.is_empty());
    }
}
