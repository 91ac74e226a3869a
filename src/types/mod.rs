//! Shared types for ratesvc

pub mod error;

pub use error::{RatesvcError, Result};
