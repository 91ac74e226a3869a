//! MongoDB client and collection wrapper

use bson::{doc, Document};
use mongodb::{
    options::{IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::types::RatesvcError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the server answers a ping
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, RatesvcError> {
        info!("Connecting to MongoDB at {}", uri);

        let client = Client::with_uri_str(with_timeouts(uri))
            .await
            .map_err(|e| RatesvcError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        let mongo = Self {
            client,
            db_name: db_name.to_string(),
        };
        mongo.ping().await?;

        info!("Connected to MongoDB database '{}'", db_name);
        Ok(mongo)
    }

    /// Round-trip a ping command
    pub async fn ping(&self) -> Result<(), RatesvcError> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| RatesvcError::Database(format!("MongoDB ping failed: {}", e)))?;
        Ok(())
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, RatesvcError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Append connection timeouts so an unreachable server fails fast
fn with_timeouts(uri: &str) -> String {
    const TIMEOUTS: &str = "serverSelectionTimeoutMS=3000&connectTimeoutMS=3000";

    if uri.contains('?') {
        return format!("{}&{}", uri, TIMEOUTS);
    }

    let has_path = uri
        .split_once("://")
        .map(|(_, rest)| rest.contains('/'))
        .unwrap_or(false);
    if has_path {
        format!("{}?{}", uri, TIMEOUTS)
    } else {
        format!("{}/?{}", uri, TIMEOUTS)
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
{
    /// Open a collection and apply its schema indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, RatesvcError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), RatesvcError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| RatesvcError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, RatesvcError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| RatesvcError::Database(format!("Find failed: {}", e)))
    }

    /// Find all documents matching a filter
    ///
    /// Fails on the first cursor error, whether a batch fetch or a document
    /// that does not decode; a partial result is never returned.
    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>, RatesvcError> {
        use futures_util::TryStreamExt;

        let cursor = self
            .inner
            .find(filter)
            .await
            .map_err(|e| RatesvcError::Database(format!("Find failed: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| RatesvcError::Database(format!("Cursor read failed: {}", e)))
    }

    /// Apply an update operator document to one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, RatesvcError> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| RatesvcError::Database(format!("Update failed: {}", e)))
    }

    /// Apply an update, inserting a document built from the filter and any
    /// `$setOnInsert` fields when nothing matches
    pub async fn upsert_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, RatesvcError> {
        self.inner
            .update_one(filter, update.into())
            .upsert(true)
            .await
            .map_err(|e| RatesvcError::Database(format!("Upsert failed: {}", e)))
    }
}
