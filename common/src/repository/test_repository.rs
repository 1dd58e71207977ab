use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Document};
use serde::{de::DeserializeOwned, Serialize};

use crate::error;

use super::{Entity, Repository};

/// In-memory document store. Items are kept as BSON documents in insertion order,
/// so filters compare exactly what MongoDB would compare.
pub struct TestRepository<T> {
    _t: std::marker::PhantomData<T>,
    pub db: Mutex<Vec<Document>>,
}

impl<T> TestRepository<T> {
    pub fn new() -> Self {
        Self {
            _t: std::marker::PhantomData,
            db: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> error::Result<MutexGuard<'_, Vec<Document>>> {
        self.db
            .lock()
            .map_err(|_| anyhow!("Test repository lock poisoned").into())
    }
}

impl<T> Default for TestRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, value)| document.get(field) == Some(value))
}

fn has_id(document: &Document, field: &str, id: &ObjectId) -> bool {
    document.get_object_id(field).map_or(false, |x| &x == id)
}

#[async_trait]
impl<T> Repository<T> for TestRepository<T>
where
    T: Entity + Send + Sync + Serialize + DeserializeOwned,
{
    async fn insert(&self, item: &T) -> error::Result<bool> {
        let document = bson::to_document(item)?;
        let mut db = self.lock()?;

        let contains = db.iter().any(|x| has_id(x, "_id", &item.id()));
        if !contains {
            db.push(document);
        }
        Ok(!contains)
    }

    async fn find_many(&self, filter: Document) -> error::Result<Vec<T>> {
        let db = self.lock()?;
        let result = db
            .iter()
            .filter(|x| matches(x, &filter))
            .map(|x| bson::from_document(x.clone()))
            .collect::<Result<Vec<T>, _>>()?;
        Ok(result)
    }

    async fn update_by_id(&self, id: &ObjectId, changes: Document) -> error::Result<Option<T>> {
        let mut db = self.lock()?;
        let Some(document) = db.iter_mut().find(|x| has_id(x, "_id", id)) else {
            return Ok(None);
        };

        for (field, value) in changes {
            document.insert(field, value);
        }
        Ok(Some(bson::from_document(document.clone())?))
    }

    async fn delete(&self, field: &str, id: &ObjectId) -> error::Result<Option<T>> {
        let mut db = self.lock()?;
        let Some(position) = db.iter().position(|x| has_id(x, field, id)) else {
            return Ok(None);
        };
        Ok(Some(bson::from_document(db.remove(position))?))
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(rename = "_id")]
        id: ObjectId,
        owner: String,
        done: bool,
    }

    impl Entity for Note {
        fn id(&self) -> ObjectId {
            self.id
        }
    }

    fn note(owner: &str, done: bool) -> Note {
        Note {
            id: ObjectId::new(),
            owner: owner.to_string(),
            done,
        }
    }

    #[actix_web::test]
    async fn insert_rejects_duplicate_ids() {
        let repo = TestRepository::<Note>::new();
        let first = note("alice", false);

        assert!(repo.insert(&first).await.unwrap());
        assert!(!repo.insert(&first).await.unwrap());
        assert_eq!(repo.db.lock().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn find_many_requires_every_filter_field() {
        let repo = TestRepository::<Note>::new();
        repo.insert(&note("alice", false)).await.unwrap();
        repo.insert(&note("alice", true)).await.unwrap();
        repo.insert(&note("bob", true)).await.unwrap();

        let all = repo.find_many(doc! {}).await.unwrap();
        assert_eq!(all.len(), 3);

        let alice = repo.find_many(doc! {"owner": "alice"}).await.unwrap();
        assert_eq!(alice.len(), 2);

        let done = repo
            .find_many(doc! {"owner": "alice", "done": true})
            .await
            .unwrap();
        assert_eq!(done.len(), 1);
        assert!(done[0].done);

        let unknown = repo.find_many(doc! {"owner": "carol"}).await.unwrap();
        assert!(unknown.is_empty());
    }

    #[actix_web::test]
    async fn update_by_id_sets_only_given_fields() {
        let repo = TestRepository::<Note>::new();
        let item = note("alice", false);
        repo.insert(&item).await.unwrap();

        let updated = repo
            .update_by_id(&item.id, doc! {"done": true})
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.owner, "alice");
        assert!(updated.done);

        let stored = repo.find_many(doc! {"_id": item.id}).await.unwrap();
        assert_eq!(stored, vec![updated]);

        let missing = repo
            .update_by_id(&ObjectId::new(), doc! {"done": true})
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[actix_web::test]
    async fn delete_removes_once() {
        let repo = TestRepository::<Note>::new();
        let item = note("alice", false);
        repo.insert(&item).await.unwrap();

        assert_eq!(repo.delete("_id", &item.id).await.unwrap(), Some(item.clone()));
        assert_eq!(repo.delete("_id", &item.id).await.unwrap(), None);
    }
}
