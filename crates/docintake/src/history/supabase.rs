//! History kept in a Supabase (PostgREST) table.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, Response};

use super::{HistoryEntry, HistoryError, HistoryStore, NewHistoryEntry, Result};
use crate::remote::error::truncate_body;
use crate::supabase::SupabaseClient;

/// Matches every UUID primary key. PostgREST refuses unfiltered deletes.
const ALL_IDS_FILTER: &str = "gte.00000000-0000-0000-0000-000000000000";

pub struct SupabaseHistoryStore {
    client: Arc<SupabaseClient>,
    table: String,
}

impl SupabaseHistoryStore {
    pub fn new(client: Arc<SupabaseClient>, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    async fn rows(response: Response) -> Result<Vec<HistoryEntry>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HistoryError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        response
            .json()
            .await
            .map_err(|e| HistoryError::InvalidResponse(e.to_string()))
    }

    async fn delete_where(&self, filter: &str) -> Result<usize> {
        let response = self
            .client
            .request(Method::DELETE, &self.client.rest_url(&self.table))
            .query(&[("id", filter)])
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(HistoryError::Request)?;
        Ok(Self::rows(response).await?.len())
    }
}

#[async_trait]
impl HistoryStore for SupabaseHistoryStore {
    async fn insert(&self, entry: NewHistoryEntry) -> Result<HistoryEntry> {
        let response = self
            .client
            .request(Method::POST, &self.client.rest_url(&self.table))
            .header("Prefer", "return=representation")
            .json(&entry)
            .send()
            .await
            .map_err(HistoryError::Request)?;

        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HistoryError::InvalidResponse("insert returned no row".to_string()))
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<HistoryEntry>> {
        let limit = limit.to_string();
        let response = self
            .client
            .request(Method::GET, &self.client.rest_url(&self.table))
            .query(&[
                ("select", "*"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(HistoryError::Request)?;
        Self::rows(response).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.delete_where(&format!("eq.{}", id)).await?;
        Ok(deleted > 0)
    }

    async fn delete_all(&self) -> Result<usize> {
        let deleted = self.delete_where(ALL_IDS_FILTER).await?;
        log::info!("Cleared {} history entries", deleted);
        Ok(deleted)
    }
}
