//! Beacon Core Library
//!
//! This crate provides shared configuration, errors, logging setup and the
//! web app manifest for Beacon.

pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;

pub use config::{AppConfig, PushConfig, ServerConfig, WorkerConfig};
pub use error::{BeaconError, BeaconResult};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use manifest::{ManifestIcon, WebAppManifest};
