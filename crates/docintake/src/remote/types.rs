//! Wire format of the webhook.

use serde::Deserialize;

use super::error::RemoteError;

/// Value of the `action` form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Rename,
    Classify,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Rename => "renommage",
            Action::Classify => "classement",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body returned for a rename request.
#[derive(Debug, Deserialize)]
struct RenameResponse {
    #[serde(default)]
    nouveau_nom: Option<String>,
    #[serde(rename = "type", default)]
    document_type: Option<String>,
}

/// Name and type proposed by the service for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameSuggestion {
    pub new_name: String,
    pub document_type: Option<String>,
}

/// Interprets a rename response body.
///
/// A missing or blank `nouveau_nom` is [`RemoteError::EmptyName`]. A missing
/// `type` is fine.
pub fn parse_rename_response(body: &str) -> Result<RenameSuggestion, RemoteError> {
    let response: RenameResponse = serde_json::from_str(body)
        .map_err(|e| RemoteError::InvalidResponse(format!("rename response is not JSON: {}", e)))?;

    let new_name = response
        .nouveau_nom
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or(RemoteError::EmptyName)?;

    Ok(RenameSuggestion {
        new_name,
        document_type: response
            .document_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
    })
}

/// Interprets a classify response body. Any non-blank text counts as success.
pub fn parse_classify_response(body: &str) -> Result<String, RemoteError> {
    let message = body.trim();
    if message.is_empty() {
        return Err(RemoteError::EmptyClassification);
    }
    Ok(message.to_string())
}
