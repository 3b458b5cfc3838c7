//! `reqwest` implementation of [`RenameService`] against the intake webhook.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

use super::error::{truncate_body, RemoteError};
use super::types::{parse_classify_response, parse_rename_response, Action, RenameSuggestion};
use super::RenameService;
use crate::config::WebhookConfig;
use crate::model::FilePayload;
use crate::sanitize::redact_url;

/// Posts one multipart form per file to a single endpoint. The `action` field
/// selects rename or classify.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    endpoint: String,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(RemoteError::Client)?;

        Ok(Self {
            client,
            endpoint: config.url.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn file_part(file: &FilePayload) -> Result<Part, RemoteError> {
        Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(RemoteError::Client)
    }

    async fn post(&self, action: Action, form: Form) -> Result<String, RemoteError> {
        debug!(
            "POST {} action={}",
            redact_url(&self.endpoint),
            action.as_str()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(RemoteError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(RemoteError::Network)?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl RenameService for WebhookClient {
    async fn rename(&self, file: &FilePayload) -> Result<RenameSuggestion, RemoteError> {
        let form = Form::new()
            .text("action", Action::Rename.as_str())
            .part("files", Self::file_part(file)?);

        let body = self.post(Action::Rename, form).await?;
        parse_rename_response(&body)
    }

    async fn classify(
        &self,
        file: &FilePayload,
        new_name: &str,
        document_type: Option<&str>,
        original_name: Option<&str>,
    ) -> Result<String, RemoteError> {
        let mut form = Form::new()
            .text("action", Action::Classify.as_str())
            .part("files", Self::file_part(file)?)
            .text("nouveau_nom", new_name.to_string())
            .text("ancien_nom", original_name.unwrap_or(&file.name).to_string());

        if let Some(document_type) = document_type.filter(|t| !t.is_empty()) {
            form = form.text("type", document_type.to_string());
        }

        let body = self.post(Action::Classify, form).await?;
        parse_classify_response(&body)
    }
}
