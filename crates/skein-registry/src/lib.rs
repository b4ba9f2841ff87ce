//! Plugin specifier resolution for skein.
//!
//! Turns the string a user hands to `skein plugin import` into raw payload
//! bytes, in three steps:
//! - [`classify`] decides whether the specifier is a local path, a remote
//!   URL, or a registry short name
//! - [`PluginIndex`] maps registry names to download URLs, pinning the
//!   release channel to a requested version or the running CLI build
//! - [`fetch_payload`] reads the resolved source into memory
//!
//! The index is fetched fresh on every import and nothing in this crate
//! retries; each failure aborts the import it belongs to.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod error;
mod fetch;
mod index;
mod specifier;

pub use error::{RegistryError, Result};
pub use fetch::fetch_payload;
pub use index::{PluginIndex, CLI_PACKAGE, DEFAULT_CHANNEL, DEFAULT_SCOPE};
pub use specifier::{classify, RegistryRequest, ResolvedSource, Resolution};
