//! HTTP client for the remote business-profile (Graph) API.
//!
//! [`api::GraphApi`] implements [`bizprofile_core::gateway::ProfileGateway`]
//! and [`source::HttpSourceFetcher`] downloads photo sources by URL.

pub mod api;
pub mod body;
pub mod source;

pub use api::{GraphApi, GraphConfig, GraphSetupError};
pub use source::HttpSourceFetcher;
