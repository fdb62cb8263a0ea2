//! Staging directory lifecycle
//!
//! One pipeline run owns one uniquely named directory under the system temp
//! root. `Drop` removes it recursively, so cleanup runs on every exit path
//! including errors raised by later pipeline stages.

use crate::error::{PackerError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const STAGING_PREFIX: &str = "prel-packer";
pub const PROPERTIES_FILE_NAME: &str = "props";

#[cfg(unix)]
const STAGING_DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const PROPERTIES_FILE_MODE: u32 = 0o666;

/// Exclusively owned staging directory, removed on drop
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    /// Create a fresh, writable staging directory
    ///
    /// The UUID suffix keeps concurrent runs from colliding on the same path.
    pub fn acquire() -> Result<Self> {
        let path = std::env::temp_dir().join(format!("{}-{}", STAGING_PREFIX, Uuid::new_v4()));

        fs::create_dir_all(&path).map_err(|e| {
            PackerError::Staging(format!(
                "Failed to create staging directory {}: {}",
                path.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(STAGING_DIR_MODE)).map_err(
                |e| {
                    PackerError::Staging(format!(
                        "Failed to set permissions on {}: {}",
                        path.display(),
                        e
                    ))
                },
            )?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the properties payload verbatim under the fixed name `props`
    pub fn write_properties(&self, payload: &[u8]) -> Result<PathBuf> {
        let props_path = self.path.join(PROPERTIES_FILE_NAME);

        fs::write(&props_path, payload).map_err(|e| {
            PackerError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write {}: {}", props_path.display(), e),
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&props_path, fs::Permissions::from_mode(PROPERTIES_FILE_MODE))
                .map_err(|e| {
                    PackerError::Io(std::io::Error::new(
                        e.kind(),
                        format!("Failed to set permissions on {}: {}", props_path.display(), e),
                    ))
                })?;
        }

        Ok(props_path)
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        // Removal failure leaves an orphan in the temp root; nothing useful
        // can be reported from a destructor.
        let _ = fs::remove_dir_all(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_creates_writable_dir() {
        let staging = StagingDir::acquire().unwrap();
        assert!(staging.path().is_dir());
        assert!(staging.path().starts_with(std::env::temp_dir()));
        std::fs::write(staging.path().join("probe"), b"ok").unwrap();
    }

    #[test]
    fn test_acquire_names_are_unique() {
        let a = StagingDir::acquire().unwrap();
        let b = StagingDir::acquire().unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_drop_removes_dir_and_contents() {
        let staging = StagingDir::acquire().unwrap();
        let path = staging.path().to_path_buf();
        std::fs::create_dir(path.join("layout")).unwrap();
        std::fs::write(path.join("layout").join("blob"), b"data").unwrap();
        drop(staging);
        assert!(!path.exists());
    }

    #[test]
    fn test_write_properties_exact_bytes() {
        let staging = StagingDir::acquire().unwrap();
        let props_path = staging.write_properties(b"image=busybox:latest\n").unwrap();
        assert_eq!(props_path.file_name().unwrap(), PROPERTIES_FILE_NAME);
        assert_eq!(
            std::fs::read(&props_path).unwrap(),
            b"image=busybox:latest\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_write_properties_non_executable_mode() {
        use std::os::unix::fs::PermissionsExt;
        let staging = StagingDir::acquire().unwrap();
        let props_path = staging.write_properties(b"").unwrap();
        let mode = std::fs::metadata(&props_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o666);
    }
}
