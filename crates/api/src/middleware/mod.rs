//! Request extractors shared by handlers.
//!
//! - [`credentials::ProfileCredentials`] -- Per-request remote credentials
//!   and target phone number id, read from headers.

pub mod credentials;
