//! Shared types, error model, and configuration for jobscout.
//!
//! This crate is the foundation depended on by all other jobscout crates.
//! It provides:
//! - [`JobscoutError`] — the unified error type
//! - Domain types ([`Posting`], [`Profile`], [`RunId`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, LimitsConfig, OpenAiConfig, ProfileConfig, RunConfig, SourcesConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{JobscoutError, Result};
pub use types::{Posting, Profile, RunId};
