//! Properties Packer Library
//!
//! This file serves as the library root for the prel-packer crate,
//! organizing and exposing the modules that make up the application.

pub mod cli;
pub mod error;
pub mod image;
pub mod materialize;
pub mod oci;
pub mod output;
pub mod packer;
pub mod properties;
pub mod registry;
pub mod source;

pub use error::{PackerError, Result};
pub use image::ImageRef;
pub use output::OutputManager;
pub use packer::Packer;
pub use source::PropsSource;
