//! Skein CLI library.
//!
//! Exposes the command implementations and output formatters so they can be
//! exercised by integration tests as well as the `skein` binary.

#![allow(clippy::missing_errors_doc)]

pub mod commands;
pub mod formatters;
