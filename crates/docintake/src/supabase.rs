//! HTTP plumbing shared by the Supabase storage and history adapters.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Authenticated client for one Supabase project.
///
/// Every request carries the service key both as `apikey` and as a bearer
/// token. Share it through an `Arc`.
#[derive(Debug)]
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    key: SecretString,
}

impl SupabaseClient {
    pub fn new(base_url: &str, key: SecretString) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/storage/v1/{path}`
    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `{base}/rest/v1/{table}`
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let key = self.key.expose_secret();
        self.http
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key)
    }
}
