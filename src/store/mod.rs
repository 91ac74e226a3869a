//! Item persistence
//!
//! The engagement service talks to storage only through [`ItemStore`]. Every
//! mutation is an [`ItemUpdate`]: a single atomic operator on one field of one
//! document, so concurrent writers compose instead of overwriting each other.

pub mod memory;
pub mod mongo;

use bson::{doc, oid::ObjectId, DateTime, Document};

use crate::db::schemas::{CommentDoc, ItemDoc};
use crate::types::Result;

pub use memory::InMemoryItemStore;
pub use mongo::MongoItemStore;

/// A single-field atomic modification of an item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemUpdate {
    /// Set-add a user to the stargazers
    AddStargazer(String),
    /// Remove a user from the stargazers
    RemoveStargazer(String),
    /// Append a comment
    PushComment(CommentDoc),
    /// Remove the comment with this id
    PullComment(ObjectId),
}

impl ItemUpdate {
    /// Render as a MongoDB update document, refreshing `metadata.updated_at`
    pub fn to_document(&self, now: DateTime) -> Result<Document> {
        let mut update = match self {
            Self::AddStargazer(user_id) => {
                doc! { "$addToSet": { "stargazers_ids": user_id.as_str() } }
            }
            Self::RemoveStargazer(user_id) => {
                doc! { "$pull": { "stargazers_ids": user_id.as_str() } }
            }
            Self::PushComment(comment) => {
                let comment = bson::to_bson(comment)?;
                doc! { "$push": { "comments": comment } }
            }
            Self::PullComment(comment_id) => {
                doc! { "$pull": { "comments": { "_id": *comment_id } } }
            }
        };
        update.insert("$set", doc! { "metadata.updated_at": now });
        Ok(update)
    }

    /// As [`to_document`](Self::to_document), plus the fields a freshly
    /// created item starts with
    pub fn to_upsert_document(&self, kind: &str, now: DateTime) -> Result<Document> {
        let mut update = self.to_document(now)?;
        update.insert(
            "$setOnInsert",
            doc! { "type": kind, "metadata.created_at": now },
        );
        Ok(update)
    }

    /// Apply the same modification to an in-memory copy
    pub fn apply_to(&self, item: &mut ItemDoc) {
        match self {
            Self::AddStargazer(user_id) => {
                if !item.has_stargazer(user_id) {
                    item.stargazers_ids.push(user_id.clone());
                }
            }
            Self::RemoveStargazer(user_id) => {
                item.stargazers_ids.retain(|id| id != user_id);
            }
            Self::PushComment(comment) => item.comments.push(comment.clone()),
            Self::PullComment(comment_id) => item.comments.retain(|c| &c.id != comment_id),
        }
    }
}

/// Document store holding items keyed by their human-readable id
#[async_trait::async_trait]
pub trait ItemStore: Send + Sync {
    async fn find_by_key(&self, id: &str) -> Result<Option<ItemDoc>>;

    async fn find_all(&self) -> Result<Vec<ItemDoc>>;

    /// Apply one atomic update to the item with this key
    async fn update_by_key(&self, id: &str, update: ItemUpdate) -> Result<()>;

    /// Apply one atomic update, creating the item with `kind` first if the
    /// key is unknown. Concurrent first writers all land on the same item.
    async fn upsert_by_key(&self, id: &str, kind: &str, update: ItemUpdate) -> Result<()>;

    /// Check the backing store is reachable
    async fn ping(&self) -> Result<()>;
}
