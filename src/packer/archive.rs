//! Gzip-compressed tar serialization of the staging tree
//!
//! The tree is streamed entry by entry through the tar builder into the gzip
//! encoder, so the archive is never buffered whole in memory. Entries are
//! rooted at `.` (the staging directory itself, not its absolute path), which
//! makes extraction reproduce the intended root wherever the archive lands.

use crate::error::{PackerError, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::Path;

/// Write the full staging tree as a tgz archive at `dest`
///
/// A mid-stream failure leaves a partial file at `dest`; it is deliberately
/// not removed, so callers can see that an attempt was made and failed.
pub fn write_archive(staging: &Path, dest: &Path) -> Result<()> {
    let file = File::create(dest).map_err(|e| {
        PackerError::Archive(format!(
            "Failed to create archive file {}: {}",
            dest.display(),
            e
        ))
    })?;

    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    builder.append_dir_all(".", staging).map_err(|e| {
        PackerError::Archive(format!(
            "Failed to write staging tree to {}: {}",
            dest.display(),
            e
        ))
    })?;

    let encoder = builder.into_inner().map_err(|e| {
        PackerError::Archive(format!("Failed to finish tar stream: {}", e))
    })?;
    encoder
        .finish()
        .map_err(|e| PackerError::Archive(format!("Failed to finish gzip stream: {}", e)))?;

    Ok(())
}
