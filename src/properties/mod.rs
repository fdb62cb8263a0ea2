//! Properties payload parsing and image reference extraction
//!
//! The payload is a line-oriented Java-style properties file whose values
//! name container images. Parsing is deliberately small: `#`/`!` comments,
//! `=` or `:` separators and trailing-backslash continuation cover the
//! files this tool is fed.

use crate::error::{PackerError, Result};
use crate::image::ImageRef;

/// A single key/value pair from the properties payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    pub value: String,
}

/// Parse a properties payload into its key/value pairs
pub fn parse(payload: &[u8]) -> Result<Vec<Property>> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| PackerError::Parse(format!("Properties payload is not valid UTF-8: {}", e)))?;

    let mut properties = Vec::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        // Trailing backslash continues the logical line
        let mut logical = trimmed.trim_end_matches('\\').trim_end().to_string();
        let mut continued = trimmed.ends_with('\\');
        while continued {
            match lines.next() {
                Some(next) => {
                    let next = next.trim();
                    continued = next.ends_with('\\');
                    logical.push_str(next.trim_end_matches('\\').trim_end());
                }
                None => break,
            }
        }

        let separator = logical
            .char_indices()
            .find(|(_, c)| *c == '=' || *c == ':')
            .map(|(i, _)| i);

        let (key, value) = match separator {
            Some(i) => (logical[..i].trim(), logical[i + 1..].trim()),
            None => {
                return Err(PackerError::Parse(format!(
                    "Properties line '{}' has no '=' or ':' separator",
                    logical
                )));
            }
        };

        if key.is_empty() {
            return Err(PackerError::Parse(format!(
                "Properties line '{}' has an empty key",
                logical
            )));
        }

        properties.push(Property {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    Ok(properties)
}

/// Extract the set of image references named by the payload's values
///
/// Every value must parse as an image reference; duplicates are removed
/// preserving first-seen order.
pub fn image_references(payload: &[u8]) -> Result<Vec<ImageRef>> {
    let mut references = Vec::new();

    for property in parse(payload)? {
        let image = ImageRef::parse(&property.value).map_err(|e| {
            PackerError::Parse(format!("Invalid image reference for key '{}': {}", property.key, e))
        })?;
        if !references.contains(&image) {
            references.push(image);
        }
    }

    Ok(references)
}
