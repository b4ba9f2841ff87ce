//! Plugin installation and persistence.
//!
//! The last stage of the import pipeline: given a declared identity and the
//! payload bytes that declared it, derive the installed path, write the
//! payload, and record the plugin in the project configuration. The installed
//! path is always derived from the declared identity, never from the
//! user-supplied specifier.
//!
//! # Layout
//!
//! Payloads land at `<project-root>/.yarn/plugins/<identity>.cjs`; other
//! tooling locates installed plugins by this exact pattern. The manifest
//! record lives in the project's `.yarnrc.yml`, keyed by that path.
//!
//! # Integrity
//!
//! Blake3 checksums (`blake3:<hex>`) are recorded when checksumming is
//! enabled and re-verified by `skein plugin list --verify`. A record without
//! a checksum field opted out of integrity checking; this is not a security
//! boundary against adversarial registries.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod checksum;
mod error;
mod installer;

pub use checksum::{calculate_checksum, constant_time_compare, verify_checksum};
pub use error::{InstallError, Result};
pub use installer::{install, installed_path, uninstall, verify_installed};
