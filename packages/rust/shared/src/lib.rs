//! Shared types, error model, and configuration for the EDD research tool.
//!
//! This crate is the foundation depended on by all other EDD crates.
//! It provides:
//! - [`EddError`] — the unified error type
//! - Request-scoped domain types ([`Query`], [`Mode`], [`SearchResult`],
//!   [`BackendOutcome`], [`AggregatedResponse`])
//! - Configuration ([`AppConfig`], credentials, config loading)

pub mod config;
pub mod credentials;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AgentsConfig, AppConfig, DefaultsConfig, SearchConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use credentials::{ApiKey, CredentialOverrides, DefaultCredentials, EffectiveCredentials};
pub use error::{EddError, Result, error_chain};
pub use types::{
    AggregatedResponse, BackendOutcome, BackendResult, DEFAULT_REGION, FailureKind, Mode, Query,
    Region, SearchFailure, SearchReport, SearchResult, SkipReason, StageOutput, TokenCount,
};
