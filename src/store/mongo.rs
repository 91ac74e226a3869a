//! MongoDB-backed item store

use bson::{doc, DateTime};
use tracing::{debug, warn};

use crate::db::schemas::{ItemDoc, ITEM_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::store::{ItemStore, ItemUpdate};
use crate::types::{RatesvcError, Result};

/// Item store over the `items` collection
pub struct MongoItemStore {
    mongo: MongoClient,
    items: MongoCollection<ItemDoc>,
}

impl MongoItemStore {
    pub async fn new(mongo: MongoClient) -> Result<Self> {
        let items = mongo.collection::<ItemDoc>(ITEM_COLLECTION).await?;
        Ok(Self { mongo, items })
    }
}

#[async_trait::async_trait]
impl ItemStore for MongoItemStore {
    async fn find_by_key(&self, id: &str) -> Result<Option<ItemDoc>> {
        self.items.find_one(doc! { "_id": id }).await
    }

    async fn find_all(&self) -> Result<Vec<ItemDoc>> {
        self.items.find_many(doc! {}).await
    }


    async fn update_by_key(&self, id: &str, update: ItemUpdate) -> Result<()> {
        let modifications = update.to_document(DateTime::now())?;
        let result = self.items.update_one(doc! { "_id": id }, modifications).await?;

        if result.matched_count == 0 {
            warn!(item_id = %id, "Update matched no item");
            return Err(RatesvcError::NotFound(format!("item {} not found", id)));
        }
        Ok(())
    }

    async fn upsert_by_key(&self, id: &str, kind: &str, update: ItemUpdate) -> Result<()> {
        let modifications = update.to_upsert_document(kind, DateTime::now())?;
        let result = self.items.upsert_one(doc! { "_id": id }, modifications).await?;

        if result.upserted_id.is_some() {
            debug!(item_id = %id, kind = %kind, "Created item");
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.mongo.ping().await
    }
}
