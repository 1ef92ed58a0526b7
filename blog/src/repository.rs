//! Key/value repositories for blog records.
//!
//! A [`Repository`] stores one record type under its own key tag, encoding
//! values as JSON. Lookups are by the record's natural key (article slug,
//! user login).

use std::marker::PhantomData;
use std::sync::Arc;

use common::{Record, Storage};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::model::{Article, User};
use crate::serde::{ARTICLE_TAG, USER_TAG, decode_key, encode_key, scan_range};

/// A record type that can be stored in a [`Repository`].
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Storage tag distinguishing this record type.
    const TAG: u8;

    /// The record's unique key.
    fn key(&self) -> &str;
}

impl Entity for Article {
    const TAG: u8 = ARTICLE_TAG;

    fn key(&self) -> &str {
        &self.slug
    }
}

impl Entity for User {
    const TAG: u8 = USER_TAG;

    fn key(&self) -> &str {
        &self.login
    }
}

/// Stores and looks up records of type `T`.
pub struct Repository<T> {
    storage: Arc<dyn Storage>,
    _entity: PhantomData<fn() -> T>,
}

pub type ArticleRepository = Repository<Article>;
pub type UserRepository = Repository<User>;

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            _entity: PhantomData,
        }
    }

    /// Encodes `entity` as the record [`save`](Repository::save) would write.
    pub(crate) fn to_record(entity: &T) -> Result<Record> {
        let value = serde_json::to_vec(entity)?;
        Ok(Record::new(encode_key(T::TAG, entity.key()), value.into()))
    }

    /// Inserts or replaces a record. Durable when this returns.
    pub async fn save(&self, entity: &T) -> Result<()> {
        self.save_all(std::slice::from_ref(entity)).await
    }

    /// Inserts or replaces several records in one atomic batch.
    pub async fn save_all(&self, entities: &[T]) -> Result<()> {
        let records = entities
            .iter()
            .map(Self::to_record)
            .collect::<Result<Vec<_>>>()?;
        self.storage.put(records).await?;
        Ok(())
    }

    pub async fn find_by_key(&self, key: &str) -> Result<Option<T>> {
        let record = self.storage.get(encode_key(T::TAG, key)).await?;
        match record {
            Some(r) => Ok(Some(serde_json::from_slice(&r.value)?)),
            None => Ok(None),
        }
    }

    /// Returns every record in key order.
    pub async fn find_all(&self) -> Result<Vec<T>> {
        let mut iter = self.storage.scan_iter(scan_range(T::TAG)).await?;
        let mut entities = Vec::new();
        while let Some(record) = iter.next().await? {
            let key = decode_key(T::TAG, &record.key)?;
            let entity: T = serde_json::from_slice(&record.value)?;
            debug_assert_eq!(entity.key(), key);
            entities.push(entity);
        }
        Ok(entities)
    }

    /// Deletes a record. Deleting a missing key is not an error.
    pub async fn delete_by_key(&self, key: &str) -> Result<()> {
        self.storage.delete(vec![encode_key(T::TAG, key)]).await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.storage.scan(scan_range(T::TAG)).await?.len())
    }
}
