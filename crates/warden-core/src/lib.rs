//! Core types, configuration, and error handling for Warden.
//!
//! This crate provides the shared foundation used by all other Warden crates:
//! - [`WardenError`]: unified error type using `thiserror` and `miette`
//! - [`WardenConfig`]: configuration loaded from `.warden.toml`
//! - Shared types: [`ChangeEntry`], [`ChangeStatus`], [`ReviewStatus`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{ApiConfig, GitConfig, LanguageRule, ReviewConfig, StatusTokens, WardenConfig};
pub use error::WardenError;
pub use types::{ChangeEntry, ChangeStatus, OutputFormat, ReviewStatus};

/// A convenience `Result` type for Warden operations.
pub type Result<T> = std::result::Result<T, WardenError>;
