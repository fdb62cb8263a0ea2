//! Image materialization: turning payload references into stored layout content

use crate::error::{PackerError, Result};
use crate::image::ImageRef;
use crate::oci::{ImageManifest, LayoutWriter};
use crate::output::OutputManager;
use crate::properties;
use crate::registry::RegistryClient;
use async_trait::async_trait;
use std::path::Path;

/// Name of the image-layout subtree inside the staging directory
pub const LAYOUT_DIR: &str = "layout";

/// Capability for extracting image references and storing their content
#[async_trait]
pub trait Materializer: Send + Sync {
    fn extract_image_references(&self, payload: &[u8]) -> Result<Vec<ImageRef>>;

    async fn store_images(&self, staging: &Path, refs: &[ImageRef]) -> Result<()>;
}

/// Production materializer: anonymous registry pulls into an OCI layout
pub struct RegistryMaterializer {
    client: RegistryClient,
    output: OutputManager,
}

impl RegistryMaterializer {
    pub fn new(timeout_secs: u64, output: OutputManager) -> Result<Self> {
        let client = RegistryClient::new(timeout_secs, output.clone())?;
        Ok(Self { client, output })
    }

    async fn store_image(&self, writer: &mut LayoutWriter, image: &ImageRef) -> Result<()> {
        self.output.step(&format!("Pulling manifest for {}", image));
        let (manifest_bytes, media_type) = self.client.pull_manifest(image).await?;
        writer.add_manifest(&manifest_bytes, &media_type, &image.to_string())?;

        let manifest: ImageManifest = serde_json::from_slice(&manifest_bytes).map_err(|e| {
            PackerError::Parse(format!("Failed to parse manifest for {}: {}", image, e))
        })?;

        self.output.step("Pulling config blob");
        let config = self.client.pull_blob(image, &manifest.config.digest).await?;
        writer.add_blob_with_digest(&manifest.config.digest, &config)?;

        for (i, layer) in manifest.layers.iter().enumerate() {
            self.output.detail(&format!(
                "Layer {}/{}: {} ({})",
                i + 1,
                manifest.layers.len(),
                layer.digest,
                self.output.format_size(layer.size)
            ));
            let data = self.client.pull_blob(image, &layer.digest).await?;
            writer.add_blob_with_digest(&layer.digest, &data)?;
        }

        Ok(())
    }
}

#[async_trait]
impl Materializer for RegistryMaterializer {
    fn extract_image_references(&self, payload: &[u8]) -> Result<Vec<ImageRef>> {
        properties::image_references(payload)
    }

    async fn store_images(&self, staging: &Path, refs: &[ImageRef]) -> Result<()> {
        let mut writer = LayoutWriter::create(&staging.join(LAYOUT_DIR))?;

        for image in refs {
            self.output.subsection(&format!("Storing {}", image));
            self.store_image(&mut writer, image).await?;
        }

        writer.finish()
    }
}
