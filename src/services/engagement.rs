//! Engagement service: stars and comments on catalog items
//!
//! Each operation loads the current item, decides, and issues at most one
//! store write. Stars are toggled with set-add/set-remove so concurrent
//! togglers converge; comments are appended and removed one element at a
//! time. An item springs into existence on its first star or comment.

use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::UserIdentity;
use crate::db::schemas::{AuthorDoc, CommentDoc, ItemDoc, DEFAULT_ITEM_KIND};
use crate::services::avatar::avatar_url;
use crate::services::clock::{Clock, IdGenerator, ObjectIdGenerator, SystemClock};
use crate::store::{ItemStore, ItemUpdate};
use crate::types::{RatesvcError, Result};

// =============================================================================
// Wire Types
// =============================================================================

/// Item as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub stargazers_count: usize,
    pub has_starred: bool,
}

impl ItemView {
    /// `has_starred` is only ever true for a known caller
    pub fn from_doc(item: &ItemDoc, caller: Option<&UserIdentity>) -> Self {
        Self {
            id: item.id.clone(),
            kind: item.kind.clone(),
            stargazers_count: item.stargazers_ids.len(),
            has_starred: caller.is_some_and(|user| item.has_stargazer(&user.id)),
        }
    }
}

/// Comment as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorView {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
}

impl From<&CommentDoc> for CommentView {
    fn from(comment: &CommentDoc) -> Self {
        Self {
            id: comment.id.to_hex(),
            text: comment.text.clone(),
            created_at: comment.created_at,
            author: AuthorView {
                id: comment.author.id.clone(),
                name: comment.author.name.clone(),
                avatar_url: avatar_url(&comment.author.email),
            },
        }
    }
}

/// Body of a star toggle
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StarRequest {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub has_starred: bool,
}

/// What a star toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarOutcome {
    /// The item did not exist and was inserted
    Created,
    /// One atomic update was issued
    Updated,
    /// The caller had already starred the item; nothing was written
    AlreadySatisfied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarResult {
    pub item: ItemView,
    pub outcome: StarOutcome,
}

// =============================================================================
// Service
// =============================================================================

fn star_update(has_starred: bool, caller: &UserIdentity) -> ItemUpdate {
    if has_starred {
        ItemUpdate::AddStargazer(caller.id.clone())
    } else {
        ItemUpdate::RemoveStargazer(caller.id.clone())
    }
}

/// Stateless engagement operations over an [`ItemStore`]
#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn ItemStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl EngagementService {
    pub fn new(store: Arc<dyn ItemStore>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, clock, ids }
    }

    /// Wall clock and random ObjectIds
    pub fn with_defaults(store: Arc<dyn ItemStore>) -> Self {
        Self::new(store, Arc::new(SystemClock), Arc::new(ObjectIdGenerator))
    }

    pub fn store(&self) -> &Arc<dyn ItemStore> {
        &self.store
    }

    /// All items with star counts, and star state for the caller if known
    pub async fn list_items(&self, caller: Option<&UserIdentity>) -> Result<Vec<ItemView>> {
        let items = self.store.find_all().await?;
        Ok(items
            .iter()
            .map(|item| ItemView::from_doc(item, caller))
            .collect())
    }

    /// Star or unstar an item for the caller
    pub async fn set_star(&self, request: StarRequest, caller: &UserIdentity) -> Result<StarResult> {
        let item_id = request.id.trim();
        if item_id.is_empty() {
            return Err(RatesvcError::BadRequest("id missing in request body".into()));
        }

        let Some(mut item) = self.store.find_by_key(item_id).await? else {
            let mut item = ItemDoc::new(item_id, request.kind.as_deref());
            let update = star_update(request.has_starred, caller);
            update.apply_to(&mut item);
            let view = ItemView::from_doc(&item, Some(caller));
            self.store.upsert_by_key(item_id, &item.kind, update).await?;

            info!(item_id = %item_id, user_id = %caller.id, starred = request.has_starred, "Created item");
            return Ok(StarResult {
                item: view,
                outcome: StarOutcome::Created,
            });
        };

        if request.has_starred && item.has_stargazer(&caller.id) {
            debug!(item_id = %item_id, user_id = %caller.id, "Item already starred");
            return Ok(StarResult {
                item: ItemView::from_doc(&item, Some(caller)),
                outcome: StarOutcome::AlreadySatisfied,
            });
        }

        let update = star_update(request.has_starred, caller);
        update.apply_to(&mut item);
        self.store.update_by_key(item_id, update).await?;

        info!(item_id = %item_id, user_id = %caller.id, starred = request.has_starred, "Updated star");
        Ok(StarResult {
            item: ItemView::from_doc(&item, Some(caller)),
            outcome: StarOutcome::Updated,
        })
    }

    /// Comments on an item in creation order; empty if the item is unknown
    pub async fn list_comments(&self, item_id: &str) -> Result<Vec<CommentView>> {
        let comments = self
            .store
            .find_by_key(item_id)
            .await?
            .map(|item| item.comments.iter().map(CommentView::from).collect())
            .unwrap_or_default();
        Ok(comments)
    }

    /// Append a comment by the caller, creating the item if needed
    ///
    /// Always a single upsert, so first comments racing on a new item all
    /// land on it.
    pub async fn add_comment(
        &self,
        item_id: &str,
        text: &str,
        caller: &UserIdentity,
    ) -> Result<CommentView> {
        if item_id.trim().is_empty() {
            return Err(RatesvcError::BadRequest("item id missing".into()));
        }
        if text.trim().is_empty() {
            return Err(RatesvcError::BadRequest("text missing in request body".into()));
        }

        let comment = CommentDoc {
            id: self.ids.next_id(),
            text: text.to_string(),
            // Stored timestamps keep milliseconds only
            created_at: self.clock.now().trunc_subsecs(3),
            author: AuthorDoc {
                id: caller.id.clone(),
                name: caller.name.clone(),
                email: caller.email.clone(),
            },
        };
        let view = CommentView::from(&comment);

        self.store
            .upsert_by_key(item_id, DEFAULT_ITEM_KIND, ItemUpdate::PushComment(comment))
            .await?;

        info!(item_id = %item_id, comment_id = %view.id, user_id = %caller.id, "Added comment");
        Ok(view)
    }

    /// Remove one of the caller's own comments
    pub async fn delete_comment(
        &self,
        item_id: &str,
        comment_id: &str,
        caller: &UserIdentity,
    ) -> Result<CommentView> {
        let comment_id = ObjectId::parse_str(comment_id)
            .map_err(|_| RatesvcError::BadRequest(format!("invalid comment id: {}", comment_id)))?;

        let item = self
            .store
            .find_by_key(item_id)
            .await?
            .ok_or_else(|| RatesvcError::NotFound("comment not found".into()))?;

        let comment = item
            .find_comment(&comment_id)
            .ok_or_else(|| RatesvcError::NotFound("comment not found".into()))?;

        if comment.author.id != caller.id {
            return Err(RatesvcError::Forbidden(
                "not authorized to delete this comment".into(),
            ));
        }

        let view = CommentView::from(comment);
        self.store
            .update_by_key(item_id, ItemUpdate::PullComment(comment_id))
            .await?;

        info!(item_id = %item_id, comment_id = %view.id, user_id = %caller.id, "Deleted comment");
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::{FixedClock, SequentialIdGenerator};
    use crate::store::InMemoryItemStore;
    use chrono::TimeZone;

    fn rick() -> UserIdentity {
        UserIdentity {
            id: "rick".into(),
            name: "Rick Sanchez".into(),
            email: "rick@sanchez.com".into(),
        }
    }

    fn morty() -> UserIdentity {
        UserIdentity {
            id: "morty".into(),
            name: "Morty Smith".into(),
            email: "morty@smith.com".into(),
        }
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 11, 2, 10, 30, 0).unwrap()
    }

    fn service_with(store: Arc<InMemoryItemStore>) -> EngagementService {
        EngagementService::new(
            store,
            Arc::new(FixedClock(timestamp())),
            Arc::new(SequentialIdGenerator::default()),
        )
    }

    fn star(id: &str, has_starred: bool) -> StarRequest {
        StarRequest {
            id: id.into(),
            kind: None,
            has_starred,
        }
    }

    fn item_with_stargazers(id: &str, stargazers: &[&str]) -> ItemDoc {
        let mut item = ItemDoc::new(id, None);
        item.stargazers_ids = stargazers.iter().map(|s| s.to_string()).collect();
        item
    }

    // -------------------------------------------------------------------------
    // Stars
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_star_creates_missing_item() {
        let store = Arc::new(InMemoryItemStore::new());
        let service = service_with(store.clone());

        let result = service.set_star(star("new/item", true), &rick()).await.unwrap();

        assert_eq!(result.outcome, StarOutcome::Created);
        assert_eq!(result.item.kind, "chart");
        assert_eq!(result.item.stargazers_count, 1);
        assert!(result.item.has_starred);

        let stored = store.find_by_key("new/item").await.unwrap().unwrap();
        assert_eq!(stored.stargazers_ids, vec!["rick".to_string()]);
    }

    #[tokio::test]
    async fn test_unstar_creates_item_without_stargazers() {
        let store = Arc::new(InMemoryItemStore::new());
        let service = service_with(store.clone());

        let mut request = star("fn/hello", false);
        request.kind = Some("function".into());
        let result = service.set_star(request, &rick()).await.unwrap();

        assert_eq!(result.outcome, StarOutcome::Created);
        assert_eq!(result.item.kind, "function");
        assert_eq!(result.item.stargazers_count, 0);
        assert!(!result.item.has_starred);
    }

    #[tokio::test]
    async fn test_star_is_idempotent() {
        let store = Arc::new(InMemoryItemStore::with_items([item_with_stargazers(
            "stable/wordpress",
            &["morty"],
        )]));
        let service = service_with(store.clone());

        let first = service.set_star(star("stable/wordpress", true), &rick()).await.unwrap();
        assert_eq!(first.outcome, StarOutcome::Updated);
        assert_eq!(store.write_count(), 1);

        let second = service.set_star(star("stable/wordpress", true), &rick()).await.unwrap();
        assert_eq!(second.outcome, StarOutcome::AlreadySatisfied);
        assert_eq!(store.write_count(), 1);
        assert_eq!(second.item.stargazers_count, 2);

        let stored = store.find_by_key("stable/wordpress").await.unwrap().unwrap();
        assert_eq!(stored.stargazers_ids, vec!["morty".to_string(), "rick".to_string()]);
    }

    #[tokio::test]
    async fn test_star_then_unstar_restores_stargazers() {
        let store = Arc::new(InMemoryItemStore::with_items([item_with_stargazers(
            "stable/wordpress",
            &["morty", "summer"],
        )]));
        let service = service_with(store.clone());

        service.set_star(star("stable/wordpress", true), &rick()).await.unwrap();
        let result = service.set_star(star("stable/wordpress", false), &rick()).await.unwrap();

        assert_eq!(result.outcome, StarOutcome::Updated);
        assert!(!result.item.has_starred);
        let stored = store.find_by_key("stable/wordpress").await.unwrap().unwrap();
        assert_eq!(stored.stargazers_ids, vec!["morty".to_string(), "summer".to_string()]);
    }

    #[tokio::test]
    async fn test_unstar_when_not_starred_still_updates() {
        let store = Arc::new(InMemoryItemStore::with_items([item_with_stargazers(
            "stable/wordpress",
            &["morty"],
        )]));
        let service = service_with(store.clone());

        let result = service.set_star(star("stable/wordpress", false), &rick()).await.unwrap();

        assert_eq!(result.outcome, StarOutcome::Updated);
        assert_eq!(result.item.stargazers_count, 1);
    }

    #[tokio::test]
    async fn test_star_requires_id() {
        let store = Arc::new(InMemoryItemStore::new());
        let service = service_with(store.clone());

        let result = service.set_star(star("  ", true), &rick()).await;
        assert!(matches!(result, Err(RatesvcError::BadRequest(_))));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_list_items_with_and_without_caller() {
        let store = Arc::new(InMemoryItemStore::with_items([
            item_with_stargazers("stable/wordpress", &["morty", "rick"]),
            item_with_stargazers("stable/drupal", &["morty"]),
        ]));
        let service = service_with(store);

        let anonymous = service.list_items(None).await.unwrap();
        assert_eq!(anonymous.len(), 2);
        assert!(anonymous.iter().all(|item| !item.has_starred));

        let as_rick = service.list_items(Some(&rick())).await.unwrap();
        let wordpress = as_rick.iter().find(|i| i.id == "stable/wordpress").unwrap();
        let drupal = as_rick.iter().find(|i| i.id == "stable/drupal").unwrap();
        assert_eq!(wordpress.stargazers_count, 2);
        assert!(wordpress.has_starred);
        assert_eq!(drupal.stargazers_count, 1);
        assert!(!drupal.has_starred);
    }

    // -------------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_comment_creates_item() {
        let store = Arc::new(InMemoryItemStore::new());
        let service = service_with(store.clone());

        let comment = service
            .add_comment("stable/wordpress", "Hello, World", &rick())
            .await
            .unwrap();

        assert_eq!(comment.id, "000000000000000000000001");
        assert_eq!(comment.created_at, timestamp());
        assert_eq!(comment.author.id, "rick");
        assert_eq!(comment.author.avatar_url, avatar_url("rick@sanchez.com"));

        let stored = store.find_by_key("stable/wordpress").await.unwrap().unwrap();
        assert_eq!(stored.kind, "chart");
        assert_eq!(stored.comments.len(), 1);
    }

    #[tokio::test]
    async fn test_created_at_matches_stored_comment() {
        let store = Arc::new(InMemoryItemStore::new());
        let service = EngagementService::new(
            store.clone(),
            Arc::new(FixedClock(Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap())),
            Arc::new(SequentialIdGenerator::default()),
        );

        let created = service
            .add_comment("stable/wordpress", "Hello, World", &rick())
            .await
            .unwrap();

        let item = store.find_by_key("stable/wordpress").await.unwrap().unwrap();
        let doc = bson::to_document(&item.comments[0]).unwrap();
        let reloaded: CommentDoc = bson::from_document(doc).unwrap();

        assert_eq!(
            serde_json::to_value(&created).unwrap(),
            serde_json::to_value(CommentView::from(&reloaded)).unwrap()
        );
        assert_eq!(
            serde_json::to_value(&created).unwrap()["created_at"],
            "2023-11-14T22:13:20.123Z"
        );
    }

    #[tokio::test]
    async fn test_concurrent_first_comments_share_one_item() {
        let store = Arc::new(InMemoryItemStore::new());
        let service = service_with(store.clone());

        let (rick, morty) = (rick(), morty());
        let (first, second) = tokio::join!(
            service.add_comment("stable/wordpress", "first", &rick),
            service.add_comment("stable/wordpress", "second", &morty),
        );
        first.unwrap();
        second.unwrap();

        let item = store.find_by_key("stable/wordpress").await.unwrap().unwrap();
        assert_eq!(item.kind, "chart");
        assert_eq!(item.comments.len(), 2);
    }

    #[tokio::test]
    async fn test_comments_keep_creation_order() {
        let store = Arc::new(InMemoryItemStore::new());
        let service = service_with(store);

        service.add_comment("stable/wordpress", "first", &rick()).await.unwrap();
        service.add_comment("stable/wordpress", "second", &morty()).await.unwrap();
        service.add_comment("stable/wordpress", "third", &rick()).await.unwrap();

        let texts: Vec<String> = service
            .list_comments("stable/wordpress")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_add_comment_requires_text() {
        let store = Arc::new(InMemoryItemStore::new());
        let service = service_with(store.clone());

        let result = service.add_comment("stable/wordpress", "   ", &rick()).await;
        assert!(matches!(result, Err(RatesvcError::BadRequest(_))));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_list_comments_of_unknown_item() {
        let service = service_with(Arc::new(InMemoryItemStore::new()));
        assert!(service.list_comments("stable/nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_own_comment() {
        let store = Arc::new(InMemoryItemStore::new());
        let service = service_with(store.clone());

        let keep = service.add_comment("stable/wordpress", "keep", &rick()).await.unwrap();
        let gone = service.add_comment("stable/wordpress", "gone", &rick()).await.unwrap();

        let deleted = service
            .delete_comment("stable/wordpress", &gone.id, &rick())
            .await
            .unwrap();
        assert_eq!(deleted, gone);

        let remaining = service.list_comments("stable/wordpress").await.unwrap();
        assert_eq!(remaining, vec![keep]);
    }

    #[tokio::test]
    async fn test_delete_other_users_comment_is_forbidden() {
        let store = Arc::new(InMemoryItemStore::new());
        let service = service_with(store.clone());

        let comment = service.add_comment("stable/wordpress", "mine", &rick()).await.unwrap();
        let writes = store.write_count();

        let result = service
            .delete_comment("stable/wordpress", &comment.id, &morty())
            .await;
        assert!(matches!(result, Err(RatesvcError::Forbidden(_))));
        assert_eq!(store.write_count(), writes);
        assert_eq!(service.list_comments("stable/wordpress").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_comment() {
        let store = Arc::new(InMemoryItemStore::new());
        let service = service_with(store);
        let unknown = ObjectId::new().to_hex();

        let result = service.delete_comment("stable/wordpress", &unknown, &rick()).await;
        assert!(matches!(result, Err(RatesvcError::NotFound(_))));

        service.add_comment("stable/wordpress", "hi", &rick()).await.unwrap();
        let result = service.delete_comment("stable/wordpress", &unknown, &rick()).await;
        assert!(matches!(result, Err(RatesvcError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_malformed_comment_id() {
        let service = service_with(Arc::new(InMemoryItemStore::new()));
        let result = service.delete_comment("stable/wordpress", "xyz", &rick()).await;
        assert!(matches!(result, Err(RatesvcError::BadRequest(_))));
    }

    #[test]
    fn test_item_view_json() {
        let item = item_with_stargazers("stable/wordpress", &["rick"]);
        let view = ItemView::from_doc(&item, Some(&rick()));

        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            serde_json::json!({
                "id": "stable/wordpress",
                "type": "chart",
                "stargazers_count": 1,
                "has_starred": true
            })
        );
    }

    #[test]
    fn test_comment_view_hides_email() {
        let comment = CommentDoc {
            id: ObjectId::new(),
            text: "Hello".into(),
            created_at: timestamp(),
            author: AuthorDoc {
                id: "rick".into(),
                name: "Rick Sanchez".into(),
                email: "rick@sanchez.com".into(),
            },
        };
        let json = serde_json::to_value(CommentView::from(&comment)).unwrap();

        assert_eq!(json["created_at"], "2017-11-02T10:30:00Z");
        assert_eq!(json["author"]["name"], "Rick Sanchez");
        assert!(json["author"].get("email").is_none());
        assert!(json["author"]["avatar_url"].is_string());
    }
}
