//! Cache storage on disk, so cached resources survive restarts.
//!
//! Layout under the root directory:
//!
//! ```text
//! <hex(bucket name)>/
//!     <sha256(key)>.json   response metadata and the original key
//!     <sha256(key)>.body   raw response body
//! ```
//!
//! Bucket directories are hex-encoded names so any bucket name is a valid
//! path and `keys()` can recover the names without an index file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use super::cache_storage::CacheStorage;
use super::http::Response;
use super::CacheStorageError;

const META_EXT: &str = "json";
const BODY_EXT: &str = "body";

#[derive(Debug, Serialize, Deserialize)]
struct StoredResponse {
    key: String,
    url: String,
    status: u16,
    #[serde(default)]
    headers: Vec<(String, String)>,
}

pub struct DiskCacheStorage {
    root: PathBuf,
}

impl DiskCacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CacheStorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(hex::encode(bucket))
    }

    fn entry_stem(key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }

    async fn existing_bucket_dir(&self, bucket: &str) -> Result<PathBuf, CacheStorageError> {
        let dir = self.bucket_dir(bucket);
        if fs::try_exists(&dir).await? {
            Ok(dir)
        } else {
            Err(CacheStorageError::BucketNotFound(bucket.to_string()))
        }
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, bucket: &str) -> Result<(), CacheStorageError> {
        fs::create_dir_all(self.bucket_dir(bucket)).await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheStorageError> {
        let mut names = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let decoded = file_name
                .to_str()
                .and_then(|s| hex::decode(s).ok())
                .and_then(|bytes| String::from_utf8(bytes).ok());
            match decoded {
                Some(name) => names.push(name),
                None => debug!(dir = ?file_name, "Skipping foreign directory in cache root"),
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, bucket: &str) -> Result<bool, CacheStorageError> {
        let dir = self.bucket_dir(bucket);
        if !fs::try_exists(&dir).await? {
            return Ok(false);
        }
        fs::remove_dir_all(&dir).await?;
        Ok(true)
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        response: Response,
    ) -> Result<(), CacheStorageError> {
        let dir = self.existing_bucket_dir(bucket).await?;
        let stem = Self::entry_stem(key);

        let meta = StoredResponse {
            key: key.to_string(),
            url: response.url,
            status: response.status,
            headers: response.headers,
        };
        // Body first: a metadata file is only visible once its body exists
        fs::write(dir.join(&stem).with_extension(BODY_EXT), &response.body).await?;
        fs::write(
            dir.join(&stem).with_extension(META_EXT),
            serde_json::to_vec_pretty(&meta)?,
        )
        .await?;
        Ok(())
    }

    async fn match_in(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<Response>, CacheStorageError> {
        let stem = Self::entry_stem(key);
        let base = self.bucket_dir(bucket).join(&stem);
        let meta_path = base.with_extension(META_EXT);
        if !fs::try_exists(&meta_path).await? {
            return Ok(None);
        }

        let meta: StoredResponse = serde_json::from_slice(&fs::read(&meta_path).await?)?;
        if meta.key != key {
            warn!(bucket, key, stored = %meta.key, "Cache entry hash collision");
            return Ok(None);
        }
        let body = fs::read(base.with_extension(BODY_EXT)).await?;

        Ok(Some(Response {
            url: meta.url,
            status: meta.status,
            headers: meta.headers,
            body,
        }))
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<String>, CacheStorageError> {
        let dir = self.bucket_dir(bucket);
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXT) {
                continue;
            }
            let meta: StoredResponse = serde_json::from_slice(&fs::read(&path).await?)?;
            keys.push(meta.key);
        }
        keys.sort();
        Ok(keys)
    }
}
