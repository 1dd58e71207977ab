pub mod mongo_repository;
pub mod test_repository;

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};

use crate::error;

pub trait Entity {
    fn id(&self) -> ObjectId;
}

/// Document store primitives the services are written against.
///
/// Filters and updates are plain BSON documents so that the same calls work
/// against MongoDB and the in-memory [`test_repository::TestRepository`].
#[async_trait]
pub trait Repository<T> {
    /// Stores `item`. Returns `false` if an item with the same id already exists.
    async fn insert(&self, item: &T) -> error::Result<bool>;
    /// Every item whose fields are equal to all the values in `filter`.
    async fn find_many(&self, filter: Document) -> error::Result<Vec<T>>;
    /// Applies `changes` with `$set` semantics and returns the item after the update,
    /// or `None` if no item has this id.
    async fn update_by_id(&self, id: &ObjectId, changes: Document) -> error::Result<Option<T>>;
    async fn delete(&self, field: &str, item: &ObjectId) -> error::Result<Option<T>>;
}

pub type RepositoryObject<T> = Arc<dyn Repository<T> + Send + Sync>;
