//! ratesvc - stars and comments for catalog items
//!
//! Signed-in users can star items and leave comments on them. Anyone can
//! read star counts and comment threads.
//!
//! ## Layout
//!
//! - **auth**: caller identity from the signed session cookie
//! - **store**: item documents in MongoDB (or in memory for development)
//! - **services**: star and comment operations
//! - **routes** / **server**: the HTTP API under `/v1`

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{RatesvcError, Result};
