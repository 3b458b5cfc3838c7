//! Process-local object store, used when no backend is configured and in tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{ObjectStore, Result, StorageError, StoredObject, UploadOptions};

#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

#[derive(Debug)]
pub struct InMemoryObjectStore {
    bucket: String,
    objects: Mutex<BTreeMap<String, StoredBlob>>,
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new("documents")
    }
}

impl InMemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    /// Content of the object at `path`, if any.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(path).map(|blob| blob.bytes.clone()))
    }

    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(path).map(|blob| blob.content_type.clone()))
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, options: &UploadOptions) -> Result<String> {
        let mut objects = self.objects.lock().map_err(|_| StorageError::LockPoisoned)?;
        if !options.upsert && objects.contains_key(path) {
            return Err(StorageError::Status {
                status: 409,
                body: "The resource already exists".to_string(),
            });
        }
        objects.insert(
            path.to_string(),
            StoredBlob {
                bytes,
                content_type: options.content_type.clone(),
            },
        );
        Ok(path.to_string())
    }

    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<String> {
        let objects = self.objects.lock().map_err(|_| StorageError::LockPoisoned)?;
        if !objects.contains_key(path) {
            return Err(StorageError::NotFound {
                path: path.to_string(),
            });
        }
        Ok(format!(
            "memory://{}/{}?expiresIn={}",
            self.bucket,
            path,
            ttl.as_secs()
        ))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        let objects = self.objects.lock().map_err(|_| StorageError::LockPoisoned)?;
        let prefix = prefix.trim_matches('/');
        let folder = if prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", prefix)
        };

        let mut dirs = BTreeSet::new();
        let mut files = Vec::new();
        for (key, blob) in objects.iter() {
            let Some(rest) = key.strip_prefix(&folder) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    dirs.insert(dir.to_string());
                }
                None => files.push(StoredObject {
                    name: rest.to_string(),
                    is_dir: false,
                    size: Some(blob.bytes.len() as u64),
                }),
            }
        }

        let mut listing: Vec<StoredObject> = dirs
            .into_iter()
            .map(|name| StoredObject {
                name,
                is_dir: true,
                size: None,
            })
            .collect();
        listing.extend(files);
        Ok(listing)
    }

    async fn remove(&self, paths: &[String]) -> Result<Vec<String>> {
        let mut objects = self.objects.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(paths
            .iter()
            .filter(|path| objects.remove(path.as_str()).is_some())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_get() {
        let store = InMemoryObjectStore::default();
        let key = store
            .upload("uploads/a.pdf", b"%PDF".to_vec(), &UploadOptions::default())
            .await
            .unwrap();

        assert_eq!(key, "uploads/a.pdf");
        assert_eq!(store.get("uploads/a.pdf").unwrap(), b"%PDF");
        assert_eq!(store.content_type("uploads/a.pdf").unwrap(), "application/pdf");
    }

    #[tokio::test]
    async fn test_upsert_controls_overwrite() {
        let store = InMemoryObjectStore::default();
        let options = UploadOptions::default();
        store.upload("uploads/a.pdf", b"1".to_vec(), &options).await.unwrap();
        store.upload("uploads/a.pdf", b"2".to_vec(), &options).await.unwrap();
        assert_eq!(store.get("uploads/a.pdf").unwrap(), b"2");

        let no_upsert = UploadOptions {
            upsert: false,
            ..UploadOptions::default()
        };
        let err = store
            .upload("uploads/a.pdf", b"3".to_vec(), &no_upsert)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Status { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_list_returns_direct_children() {
        let store = InMemoryObjectStore::default();
        let options = UploadOptions::default();
        for key in ["uploads/a.pdf", "uploads/.keep", "uploads/old/b.pdf", "other/c.pdf"] {
            store.upload(key, vec![0; 3], &options).await.unwrap();
        }

        let listing = store.list("uploads").await.unwrap();
        let names: Vec<(&str, bool)> = listing
            .iter()
            .map(|o| (o.name.as_str(), o.is_dir))
            .collect();
        assert_eq!(names, vec![("old", true), (".keep", false), ("a.pdf", false)]);
    }

    #[tokio::test]
    async fn test_signed_url_requires_object() {
        let store = InMemoryObjectStore::default();
        let err = store
            .create_signed_url("uploads/missing.pdf", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));

        store
            .upload("uploads/a.pdf", vec![1], &UploadOptions::default())
            .await
            .unwrap();
        let url = store
            .create_signed_url("uploads/a.pdf", Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(url, "memory://documents/uploads/a.pdf?expiresIn=3600");
    }

    #[tokio::test]
    async fn test_remove_reports_removed_keys() {
        let store = InMemoryObjectStore::default();
        store
            .upload("uploads/a.pdf", vec![1], &UploadOptions::default())
            .await
            .unwrap();

        let removed = store
            .remove(&["uploads/a.pdf".to_string(), "uploads/none.pdf".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, vec!["uploads/a.pdf".to_string()]);
        assert!(store.keys().is_empty());
    }
}
