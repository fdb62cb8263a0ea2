//! Anonymous Docker Registry HTTP API v2 client used to materialize images

pub mod auth;
pub mod client;

pub use client::RegistryClient;
