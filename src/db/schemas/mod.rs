//! Database schemas for ratesvc
//!
//! Defines MongoDB document structures for items and their comments.

mod item;
mod metadata;

pub use item::{AuthorDoc, CommentDoc, ItemDoc, DEFAULT_ITEM_KIND, ITEM_COLLECTION};
pub use metadata::Metadata;
