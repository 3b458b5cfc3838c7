//! Supabase Storage REST adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Response};
use serde::Deserialize;
use serde_json::json;

use super::{ObjectStore, Result, StorageError, StoredObject, UploadOptions};
use crate::remote::error::truncate_body;
use crate::supabase::SupabaseClient;

/// Objects requested per listing page.
const LIST_PAGE_SIZE: u32 = 1000;

pub struct SupabaseObjectStore {
    client: Arc<SupabaseClient>,
    bucket: String,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

#[derive(Debug, Deserialize)]
struct ObjectMetadata {
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
    /// Folders are listed without an id.
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    metadata: Option<ObjectMetadata>,
}

impl From<ListedObject> for StoredObject {
    fn from(object: ListedObject) -> Self {
        StoredObject {
            is_dir: object.id.is_none(),
            size: object.metadata.and_then(|m| m.size),
            name: object.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RemovedObject {
    name: String,
}

impl SupabaseObjectStore {
    pub fn new(client: Arc<SupabaseClient>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            page_size: LIST_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    async fn list_page(&self, prefix: &str, offset: u32) -> Result<Vec<ListedObject>> {
        let url = self
            .client
            .storage_url(&format!("object/list/{}", self.bucket));

        let response = self
            .client
            .request(Method::POST, &url)
            .json(&json!({
                "prefix": prefix,
                "limit": self.page_size,
                "offset": offset,
                "sortBy": { "column": "name", "order": "asc" },
            }))
            .send()
            .await
            .map_err(StorageError::Request)?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(format!("listing: {}", e)))
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Status {
            status: status.as_u16(),
            body: truncate_body(&body),
        })
    }
}

#[async_trait]
impl ObjectStore for SupabaseObjectStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, options: &UploadOptions) -> Result<String> {
        let url = self
            .client
            .storage_url(&format!("object/{}/{}", self.bucket, path));
        log::debug!("Uploading {} bytes to {}/{}", bytes.len(), self.bucket, path);

        let response = self
            .client
            .request(Method::POST, &url)
            .header("content-type", &options.content_type)
            .header("cache-control", format!("max-age={}", options.cache_control_secs))
            .header("x-upsert", options.upsert.to_string())
            .body(bytes)
            .send()
            .await
            .map_err(StorageError::Request)?;
        Self::check(response).await?;

        Ok(path.to_string())
    }

    async fn create_signed_url(&self, path: &str, ttl: Duration) -> Result<String> {
        let url = self
            .client
            .storage_url(&format!("object/sign/{}/{}", self.bucket, path));

        let response = self
            .client
            .request(Method::POST, &url)
            .json(&json!({ "expiresIn": ttl.as_secs() }))
            .send()
            .await
            .map_err(StorageError::Request)?;
        let signed: SignedUrlResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(format!("signed URL: {}", e)))?;

        // The API returns a path relative to /storage/v1.
        Ok(self.client.storage_url(&signed.signed_url))
    }

    /// Pages through the listing until a short page comes back.
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        let prefix = prefix.trim_matches('/');
        let mut objects = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.list_page(prefix, offset).await?;
            let count = page.len() as u32;
            objects.extend(page.into_iter().map(StoredObject::from));
            if count < self.page_size {
                break;
            }
            offset += count;
        }
        log::debug!("Listed {} object(s) under {}/{}", objects.len(), self.bucket, prefix);
        Ok(objects)
    }

    async fn remove(&self, paths: &[String]) -> Result<Vec<String>> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.client.storage_url(&format!("object/{}", self.bucket));

        let response = self
            .client
            .request(Method::DELETE, &url)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(StorageError::Request)?;
        let removed: Vec<RemovedObject> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(format!("remove: {}", e)))?;

        Ok(removed.into_iter().map(|object| object.name).collect())
    }
}
