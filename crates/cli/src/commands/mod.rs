//! CLI command implementations.

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod comments;
pub mod favorites;
pub mod search;
