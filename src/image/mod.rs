//! Container image reference parsing
//!
//! Implements the docker-style reference grammar used in properties values:
//! `[registry/]repository[:tag][@sha256:digest]`. Bare Docker Hub names get
//! the implicit `library/` namespace, and `latest` is assumed when neither a
//! tag nor a digest is present.

use crate::error::{PackerError, Result};
use std::fmt;

const DEFAULT_REGISTRY: &str = "docker.io";
const DEFAULT_TAG: &str = "latest";

/// A fully qualified container image reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    registry: String,
    repository: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(PackerError::Parse(
                "Image reference cannot be empty".to_string(),
            ));
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(PackerError::Parse(format!(
                "Image reference '{}' contains whitespace",
                reference
            )));
        }

        let (name, digest) = match reference.split_once('@') {
            Some((name, digest)) => {
                Self::validate_digest(digest)?;
                (name, Some(digest.to_string()))
            }
            None => (reference, None),
        };

        // A ':' only introduces a tag when it appears after the last '/';
        // a colon at index 0 leaves an empty repository, caught below
        let (name, tag) = match name.rfind(':') {
            Some(colon) if name.rfind('/').is_none_or(|slash| colon > slash) => {
                let tag = &name[colon + 1..];
                if tag.is_empty() {
                    return Err(PackerError::Parse(format!(
                        "Image reference '{}' has an empty tag",
                        reference
                    )));
                }
                (&name[..colon], Some(tag.to_string()))
            }
            _ => (name, None),
        };

        if name.is_empty() {
            return Err(PackerError::Parse(format!(
                "Image reference '{}' has no repository",
                reference
            )));
        }

        // The first path component is a registry host only when it can be one
        let (registry, mut repository) = match name.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first.to_string(), rest.to_string())
            }
            _ => (DEFAULT_REGISTRY.to_string(), name.to_string()),
        };

        if repository.is_empty() {
            return Err(PackerError::Parse(format!(
                "Image reference '{}' has no repository",
                reference
            )));
        }

        if registry == DEFAULT_REGISTRY && !repository.contains('/') {
            repository = format!("library/{}", repository);
        }

        let mut tag = tag;
        if tag.is_none() && digest.is_none() {
            tag = Some(DEFAULT_TAG.to_string());
        }

        Ok(Self {
            registry,
            repository,
            tag,
            digest,
        })
    }

    fn validate_digest(digest: &str) -> Result<()> {
        let hash = digest.strip_prefix("sha256:").ok_or_else(|| {
            PackerError::Parse(format!("Digest '{}' must start with 'sha256:'", digest))
        })?;
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PackerError::Parse(format!(
                "Digest '{}' is not a valid sha256 digest",
                digest
            )));
        }
        Ok(())
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Registry host used for API calls (Docker Hub uses a dedicated endpoint)
    pub fn registry_host(&self) -> &str {
        if self.registry == DEFAULT_REGISTRY {
            "registry-1.docker.io"
        } else {
            &self.registry
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Reference to request from the registry: the digest when pinned, else the tag
    pub fn reference(&self) -> &str {
        match &self.digest {
            Some(digest) => digest,
            None => self.tag.as_deref().unwrap_or(DEFAULT_TAG),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_name() {
        let image = ImageRef::parse("busybox").unwrap();
        assert_eq!(image.registry(), "docker.io");
        assert_eq!(image.repository(), "library/busybox");
        assert_eq!(image.tag(), Some("latest"));
        assert_eq!(image.digest(), None);
    }

    #[test]
    fn test_parse_fully_qualified() {
        let image = ImageRef::parse("docker.io/library/busybox:latest").unwrap();
        assert_eq!(image.registry(), "docker.io");
        assert_eq!(image.repository(), "library/busybox");
        assert_eq!(image.reference(), "latest");
        assert_eq!(image.to_string(), "docker.io/library/busybox:latest");
    }

    #[test]
    fn test_parse_private_registry_with_port() {
        let image = ImageRef::parse("registry.example.com:5000/team/app:v1.2").unwrap();
        assert_eq!(image.registry(), "registry.example.com:5000");
        assert_eq!(image.registry_host(), "registry.example.com:5000");
        assert_eq!(image.repository(), "team/app");
        assert_eq!(image.tag(), Some("v1.2"));
    }

    #[test]
    fn test_parse_localhost_registry() {
        let image = ImageRef::parse("localhost:5000/app").unwrap();
        assert_eq!(image.registry(), "localhost:5000");
        assert_eq!(image.repository(), "app");
        assert_eq!(image.tag(), Some("latest"));
    }

    #[test]
    fn test_parse_digest_reference() {
        let digest = "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        let image = ImageRef::parse(&format!("busybox@{}", digest)).unwrap();
        assert_eq!(image.digest(), Some(digest));
        assert_eq!(image.tag(), None);
        assert_eq!(image.reference(), digest);
    }

    #[test]
    fn test_docker_hub_api_host() {
        let image = ImageRef::parse("busybox").unwrap();
        assert_eq!(image.registry_host(), "registry-1.docker.io");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(ImageRef::parse("").is_err());
        assert!(ImageRef::parse(":latest").is_err());
        assert!(ImageRef::parse("busybox:").is_err());
        assert!(ImageRef::parse("has space:latest").is_err());
        assert!(ImageRef::parse("busybox@sha256:short").is_err());
        assert!(ImageRef::parse("busybox@md5:abcd").is_err());
    }

    #[test]
    fn test_namespaced_hub_repository_keeps_namespace() {
        let image = ImageRef::parse("grafana/grafana:10.0.0").unwrap();
        assert_eq!(image.repository(), "grafana/grafana");
    }
}
