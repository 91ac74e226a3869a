//! Item document schema
//!
//! One document per catalog item. Stargazers and comments live inside the
//! item so every engagement change is a single-document update.

use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for items
pub const ITEM_COLLECTION: &str = "items";

/// Kind assigned to items created without one
pub const DEFAULT_ITEM_KIND: &str = "chart";

/// Item document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ItemDoc {
    /// Human-readable key, e.g. "stable/wordpress"
    #[serde(rename = "_id")]
    pub id: String,

    /// Category tag ("chart", "function", ...)
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,

    /// Users who starred the item, without duplicates
    #[serde(default)]
    pub stargazers_ids: Vec<String>,

    /// Comments in creation order
    #[serde(default)]
    pub comments: Vec<CommentDoc>,

    #[serde(default)]
    pub metadata: Metadata,
}

fn default_kind() -> String {
    DEFAULT_ITEM_KIND.to_string()
}

impl ItemDoc {
    /// Create an empty item; a blank kind falls back to "chart"
    pub fn new(id: impl Into<String>, kind: Option<&str>) -> Self {
        let kind = kind
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .unwrap_or_else(default_kind);

        Self {
            id: id.into(),
            kind,
            stargazers_ids: Vec::new(),
            comments: Vec::new(),
            metadata: Metadata::default(),
        }
    }

    pub fn has_stargazer(&self, user_id: &str) -> bool {
        self.stargazers_ids.iter().any(|id| id == user_id)
    }

    pub fn find_comment(&self, comment_id: &ObjectId) -> Option<&CommentDoc> {
        self.comments.iter().find(|c| &c.id == comment_id)
    }
}

/// A comment embedded in an item
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CommentDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub text: String,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    /// Snapshot of the author at the time of writing
    pub author: AuthorDoc,
}

/// Author snapshot stored with each comment
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AuthorDoc {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Never sent to clients; feeds avatar derivation
    #[serde(default)]
    pub email: String,
}

impl IntoIndexes for ItemDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Comment removal matches on the embedded id
            (
                doc! { "comments._id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("comment_id_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "stargazers_ids": 1 },
                Some(
                    IndexOptions::builder()
                        .name("stargazers_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_defaults_to_chart() {
        assert_eq!(ItemDoc::new("stable/wordpress", None).kind, "chart");
        assert_eq!(ItemDoc::new("stable/wordpress", Some("  ")).kind, "chart");
        assert_eq!(ItemDoc::new("fn/hello", Some("function")).kind, "function");
    }

    #[test]
    fn test_bson_shape() {
        let mut item = ItemDoc::new("stable/wordpress", None);
        item.stargazers_ids.push("user-1".into());
        let doc = bson::to_document(&item).unwrap();

        assert_eq!(doc.get_str("_id").unwrap(), "stable/wordpress");
        assert_eq!(doc.get_str("type").unwrap(), "chart");
        assert_eq!(doc.get_array("stargazers_ids").unwrap().len(), 1);
        assert!(doc.get_array("comments").unwrap().is_empty());
    }

    #[test]
    fn test_decode_sparse_document() {
        // Items written before comments existed carry no comments field
        let doc = doc! { "_id": "stable/drupal", "stargazers_ids": ["a", "b"] };
        let item: ItemDoc = bson::from_document(doc).unwrap();

        assert_eq!(item.kind, "chart");
        assert_eq!(item.stargazers_ids.len(), 2);
        assert!(item.comments.is_empty());
        assert!(item.has_stargazer("a"));
        assert!(!item.has_stargazer("c"));
    }
}
