//! Services that orchestrate API calls and session state.
//!
//! # Services
//!
//! - `auth` - Registration, verification, login, password recovery, logout
//! - `account` - Profile, password change, order history

pub mod account;
pub mod auth;

pub use account::AccountService;
pub use auth::{AuthService, LoginOutcome};
