//! Registry pull client
//!
//! Pulls manifests and blobs over the Docker Registry HTTP API v2 with
//! anonymous authentication. Multi-platform indexes are resolved to the
//! `linux/amd64` entry before storage.

use crate::error::{PackerError, Result};
use crate::image::ImageRef;
use crate::oci::{Descriptor, ImageIndex, media_types};
use crate::output::OutputManager;
use crate::registry::auth;
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::Mutex;

const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.manifest.v1+json, \
    application/vnd.oci.image.index.v1+json, \
    application/vnd.docker.distribution.manifest.v2+json, \
    application/vnd.docker.distribution.manifest.list.v2+json";

const TARGET_ARCHITECTURE: &str = "amd64";
const TARGET_OS: &str = "linux";

pub struct RegistryClient {
    client: reqwest::Client,
    output: OutputManager,
    // Anonymous tokens, keyed by registry host + repository
    tokens: Mutex<HashMap<String, String>>,
}

impl RegistryClient {
    pub fn new(timeout_secs: u64, output: OutputManager) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PackerError::Store(format!("Failed to create registry client: {}", e)))?;

        Ok(Self {
            client,
            output,
            tokens: Mutex::new(HashMap::new()),
        })
    }

    /// Pull the image manifest, following a multi-platform index to the
    /// `linux/amd64` entry. Returns the manifest bytes and their media type.
    pub async fn pull_manifest(&self, image: &ImageRef) -> Result<(Vec<u8>, String)> {
        let (data, media_type) = self
            .pull_manifest_reference(image, image.reference())
            .await?;

        if !media_types::is_index(&media_type) {
            return Ok((data, media_type));
        }

        self.output
            .detail(&format!("{} is a multi-platform index", image));

        let index: ImageIndex = serde_json::from_slice(&data)
            .map_err(|e| PackerError::Parse(format!("Failed to parse image index: {}", e)))?;
        let descriptor = select_platform_manifest(&index).ok_or_else(|| {
            PackerError::Store(format!(
                "Image {} has no {}/{} manifest",
                image, TARGET_OS, TARGET_ARCHITECTURE
            ))
        })?;

        self.pull_manifest_reference(image, &descriptor.digest).await
    }

    async fn pull_manifest_reference(
        &self,
        image: &ImageRef,
        reference: &str,
    ) -> Result<(Vec<u8>, String)> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            registry_base_url(image),
            image.repository(),
            reference
        );

        let response = self.get(image, &url, Some(MANIFEST_ACCEPT)).await?;
        if !response.status().is_success() {
            return Err(PackerError::Store(format!(
                "Failed to pull manifest {} for {}: HTTP status {}",
                reference,
                image,
                response.status()
            )));
        }

        let media_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(media_types::DOCKER_MANIFEST)
            .to_string();

        let data = response
            .bytes()
            .await
            .map_err(|e| PackerError::Store(format!("Failed to read manifest body: {}", e)))?;

        Ok((data.to_vec(), media_type))
    }

    /// Pull a blob and verify its content against the requested digest
    pub async fn pull_blob(&self, image: &ImageRef, digest: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/v2/{}/blobs/{}",
            registry_base_url(image),
            image.repository(),
            digest
        );

        let response = self.get(image, &url, None).await?;
        if !response.status().is_success() {
            return Err(PackerError::Store(format!(
                "Failed to pull blob {} for {}: HTTP status {}",
                digest,
                image,
                response.status()
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| PackerError::Store(format!("Failed to read blob body: {}", e)))?;

        let actual = format!("sha256:{}", hex::encode(Sha256::digest(&data)));
        if actual != digest {
            return Err(PackerError::Store(format!(
                "Blob digest mismatch for {}: expected {}, got {}",
                image, digest, actual
            )));
        }

        Ok(data.to_vec())
    }

    /// GET with anonymous bearer auth: retry once with a fresh token when the
    /// registry answers 401 with a Bearer challenge.
    async fn get(
        &self,
        image: &ImageRef,
        url: &str,
        accept: Option<&str>,
    ) -> Result<reqwest::Response> {
        let token_key = format!("{}/{}", image.registry_host(), image.repository());
        let cached = self.tokens.lock().await.get(&token_key).cloned();

        let response = self.send(url, accept, cached.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get("www-authenticate")
            .and_then(|v| v.to_str().ok())
            .and_then(auth::parse_challenge)
            .ok_or_else(|| {
                PackerError::Store(format!(
                    "Registry refused anonymous access to {} without a Bearer challenge",
                    image
                ))
            })?;

        let token = auth::anonymous_token(&self.client, &challenge, &self.output).await?;
        self.tokens.lock().await.insert(token_key, token.clone());

        self.send(url, accept, Some(&token)).await
    }

    async fn send(
        &self,
        url: &str,
        accept: Option<&str>,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header("Accept", accept);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .map_err(|e| PackerError::Store(format!("Request to {} failed: {}", url, e)))
    }
}

fn registry_base_url(image: &ImageRef) -> String {
    let host = image.registry_host();
    // Local registries are commonly plain HTTP
    if host.starts_with("localhost") || host.starts_with("127.0.0.1") {
        format!("http://{}", host)
    } else {
        format!("https://{}", host)
    }
}

fn select_platform_manifest(index: &ImageIndex) -> Option<&Descriptor> {
    index.manifests.iter().find(|descriptor| {
        descriptor
            .platform
            .as_ref()
            .is_some_and(|p| p.architecture == TARGET_ARCHITECTURE && p.os == TARGET_OS)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oci::Platform;

    fn descriptor(architecture: &str, os: &str) -> Descriptor {
        Descriptor {
            media_type: media_types::OCI_MANIFEST.to_string(),
            digest: format!("sha256:{}", "0".repeat(64)),
            size: 2,
            platform: Some(Platform {
                architecture: architecture.to_string(),
                os: os.to_string(),
                variant: None,
            }),
            annotations: None,
        }
    }

    #[test]
    fn test_select_platform_prefers_linux_amd64() {
        let index = ImageIndex {
            schema_version: 2,
            media_type: None,
            manifests: vec![
                descriptor("arm64", "linux"),
                descriptor("amd64", "linux"),
                descriptor("amd64", "windows"),
            ],
        };
        let selected = select_platform_manifest(&index).unwrap();
        let platform = selected.platform.as_ref().unwrap();
        assert_eq!(platform.architecture, "amd64");
        assert_eq!(platform.os, "linux");
    }

    #[test]
    fn test_select_platform_none_when_absent() {
        let index = ImageIndex {
            schema_version: 2,
            media_type: None,
            manifests: vec![descriptor("arm64", "linux")],
        };
        assert!(select_platform_manifest(&index).is_none());
    }

    #[test]
    fn test_registry_base_url_schemes() {
        let hub = ImageRef::parse("busybox").unwrap();
        assert_eq!(
            registry_base_url(&hub),
            "https://registry-1.docker.io"
        );

        let local = ImageRef::parse("localhost:5000/app").unwrap();
        assert_eq!(registry_base_url(&local), "http://localhost:5000");
    }
}
