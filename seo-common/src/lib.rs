//! # SEO Common Library
//!
//! Shared code for the SEO evaluator crates:
//! - Error type
//! - Configuration loading (TOML, environment, compiled defaults)
//! - Database initialization and persisted models

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
