//! Compliance web-search backend.
//!
//! This crate wraps the external search endpoint used for Enhanced Due
//! Diligence research:
//! - [`SearchClient`] — one broad compliance search per target
//! - [`DeepDiveTool`] — narrow follow-up search scoped to one [`RiskCategory`]
//! - [`prompt`] — the fixed prompt templates both calls are built from
//!
//! Neither call ever returns a Rust error for transport or HTTP problems;
//! both degrade to [`SearchResult::Failure`](edd_shared::SearchResult).

mod category;
mod client;
mod deep_dive;
mod error;
pub mod prompt;
mod wire;

pub use category::RiskCategory;
pub use client::{SearchClient, SearchEndpoint};
pub use deep_dive::{DeepDiveRequest, DeepDiveTool};
pub use error::SearchError;
pub use wire::{ChatMessage, SearchContextSize, SearchPayload, UserLocation, WebSearchOptions};
