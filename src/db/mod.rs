//! Database layer for ratesvc
//!
//! Provides MongoDB storage for engagement items.

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
pub use schemas::{AuthorDoc, CommentDoc, ItemDoc, Metadata};
