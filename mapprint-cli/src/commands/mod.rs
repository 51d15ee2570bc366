//! CLI command implementations.
//!
//! - [`config`] - Configuration file management (path, init, show)
//! - [`render`] - Render a map definition to PNG

pub mod config;
pub mod render;
