//! # Melody Common Library
//!
//! Shared code for the Melody chat services:
//! - Configuration loading (TOML file, environment overrides, defaults)
//! - Common error type

pub mod config;
pub mod error;

pub use error::{Error, Result};
