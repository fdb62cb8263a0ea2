//! The archive-assembly pipeline
//!
//! Four strictly sequential stages: acquire a staging directory, resolve and
//! persist the properties payload, materialize the referenced images, and
//! stream the staging tree into a gzip-compressed tar archive. Failure at any
//! stage aborts the run; the staging directory is removed on every exit path.

pub mod archive;
pub mod staging;

pub use staging::StagingDir;

use crate::error::Result;
use crate::materialize::Materializer;
use crate::output::OutputManager;
use crate::source::{Fetcher, PropsSource};
use std::path::Path;

pub struct Packer {
    fetcher: Box<dyn Fetcher>,
    materializer: Box<dyn Materializer>,
    output: OutputManager,
}

impl Packer {
    pub fn new(
        fetcher: Box<dyn Fetcher>,
        materializer: Box<dyn Materializer>,
        output: OutputManager,
    ) -> Self {
        Self {
            fetcher,
            materializer,
            output,
        }
    }

    /// Pack the properties payload and its images into a tgz archive
    pub async fn pack(&self, source: &PropsSource, archive_path: &Path) -> Result<()> {
        // Dropped on every return path below, removing the directory tree
        let staging = StagingDir::acquire()?;
        self.output
            .debug(&format!("Staging directory: {}", staging.path().display()));

        let payload = source.resolve(self.fetcher.as_ref()).await?;
        self.output.verbose(&format!(
            "Resolved properties payload ({})",
            self.output.format_size(payload.len() as u64)
        ));

        staging.write_properties(&payload)?;

        let refs = self.materializer.extract_image_references(&payload)?;
        self.output
            .info(&format!("Found {} image reference(s)", refs.len()));

        self.materializer.store_images(staging.path(), &refs).await?;

        self.output.info(&format!(
            "Creating zipped archive {}",
            archive_path.display()
        ));
        archive::write_archive(staging.path(), archive_path)?;

        Ok(())
    }
}
