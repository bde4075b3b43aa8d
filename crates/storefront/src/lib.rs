//! Agora Storefront library.
//!
//! Client layer over the remote storefront REST API: session lifecycle,
//! product search, favorites, reviews, account, catalog and cart.
//!
//! # Architecture
//!
//! - [`api`] - HTTP wrapper, wire types and the error taxonomy
//! - [`storage`] - Durable key/value storage (memory or JSON file)
//! - [`store`] - Reducer-driven state containers with change subscription
//! - [`session`], [`services`] - Session state machine and the auth/account flows
//! - [`search`] - Search/filter orchestration, quick search, recent searches
//! - [`favorites`], [`comments`] - Optimistic and apply-on-success mutations
//! - [`catalog`], [`cart`] - Cached categories and the local cart
//! - [`state`] - `AppState`, the handle bundling every service

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod comments;
pub mod config;
pub mod error;
pub mod favorites;
pub mod search;
pub mod services;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;
