//! Agora Core - Shared types library.
//!
//! This crate provides common types used across all Agora components:
//! - `storefront` - Client library over the remote storefront API
//! - `cli` - Command-line front end driving the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and review scores

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
