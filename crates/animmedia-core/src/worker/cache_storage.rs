//! Named buckets of cached responses.
//!
//! `CacheStorage` is the Cache Storage API reduced to what the controller
//! uses: buckets are created on open, listed, deleted whole, and hold
//! responses keyed by request URL.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::http::Response;
use super::CacheStorageError;

#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the bucket if it does not exist yet.
    async fn open(&self, bucket: &str) -> Result<(), CacheStorageError>;

    /// Names of all existing buckets.
    async fn keys(&self) -> Result<Vec<String>, CacheStorageError>;

    /// Delete a bucket and everything in it. Returns whether it existed.
    async fn delete(&self, bucket: &str) -> Result<bool, CacheStorageError>;

    /// Store a response, replacing any previous one for the key.
    async fn put(&self, bucket: &str, key: &str, response: Response)
        -> Result<(), CacheStorageError>;

    async fn match_in(&self, bucket: &str, key: &str)
        -> Result<Option<Response>, CacheStorageError>;

    /// Request keys stored in a bucket.
    async fn entries(&self, bucket: &str) -> Result<Vec<String>, CacheStorageError>;

    /// Store several responses, stopping at the first failure.
    async fn put_all(
        &self,
        bucket: &str,
        responses: Vec<(String, Response)>,
    ) -> Result<(), CacheStorageError> {
        for (key, response) in responses {
            self.put(bucket, &key, response).await?;
        }
        Ok(())
    }
}

/// In-process cache storage. Buckets are listed in creation order.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    buckets: RwLock<Vec<(String, HashMap<String, Response>)>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, bucket: &str) -> Result<(), CacheStorageError> {
        let mut buckets = self.buckets.write().await;
        if !buckets.iter().any(|(name, _)| name == bucket) {
            buckets.push((bucket.to_string(), HashMap::new()));
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheStorageError> {
        Ok(self
            .buckets
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn delete(&self, bucket: &str) -> Result<bool, CacheStorageError> {
        let mut buckets = self.buckets.write().await;
        let before = buckets.len();
        buckets.retain(|(name, _)| name != bucket);
        Ok(buckets.len() != before)
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        response: Response,
    ) -> Result<(), CacheStorageError> {
        let mut buckets = self.buckets.write().await;
        match buckets.iter_mut().find(|(name, _)| name == bucket) {
            Some((_, entries)) => {
                entries.insert(key.to_string(), response);
                Ok(())
            }
            None => Err(CacheStorageError::BucketNotFound(bucket.to_string())),
        }
    }

    async fn match_in(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<Response>, CacheStorageError> {
        Ok(self
            .buckets
            .read()
            .await
            .iter()
            .find(|(name, _)| name == bucket)
            .and_then(|(_, entries)| entries.get(key).cloned()))
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<String>, CacheStorageError> {
        let buckets = self.buckets.read().await;
        let mut keys: Vec<String> = buckets
            .iter()
            .find(|(name, _)| name == bucket)
            .map(|(_, entries)| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}
