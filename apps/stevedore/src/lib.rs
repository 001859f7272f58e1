//! # Stevedore
//!
//! The installer application around `stevedore-core`: configuration
//! loading, the command line and the HTTP render API.
//!
//! Exposed as a library so the integration tests can drive the router and
//! the configuration loader directly.

pub mod api;
pub mod cli;
pub mod config;
