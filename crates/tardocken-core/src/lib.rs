//! Core types and configuration for tardocken.
//!
//! This crate defines the `.dockerignore` rule matcher ([`IgnoreRuleSet`]),
//! the request file schema ([`ContextRequest`]), path mappings
//! ([`Replacement`]), and shared error types.

pub mod config;
pub mod error;
pub mod ignore;

pub use config::{ContextRequest, Replacement};
pub use error::{Error, Result};
pub use ignore::IgnoreRuleSet;
