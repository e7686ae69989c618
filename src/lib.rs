//! User accounts for a small library application.
//!
//! [`store::UserStore`] keeps every account in memory and rewrites a JSON
//! file after each change. The `shelf` binary wraps it in a command line
//! and an interactive shell.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod user;

pub use error::AccountError;
pub use store::UserStore;
pub use user::{hash_password, NewUser, Role, User};
