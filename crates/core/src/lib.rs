//! Business-profile domain logic.
//!
//! Pure change detection over profile fields, the photo upload state
//! machine, and the gateway traits the HTTP layer implements. Nothing in
//! this crate performs network I/O directly.

pub mod changeset;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod handle;
pub mod media;
pub mod profile;
pub mod types;
pub mod upload;
pub mod validation;
