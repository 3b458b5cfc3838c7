//! Emptying the uploads folder.

use serde::Serialize;

use super::{ObjectStore, Result, UploadOptions, KEEP_FILE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub message: String,
    pub deleted_files: Vec<String>,
}

/// Removes every file directly under `prefix`, keeping the `.keep`
/// placeholder (created if missing) and any sub-folders.
pub async fn cleanup_uploads(store: &dyn ObjectStore, prefix: &str) -> Result<CleanupReport> {
    let prefix = prefix.trim_matches('/');
    let keep_path = format!("{}/{}", prefix, KEEP_FILE);
    store
        .upload(
            &keep_path,
            Vec::new(),
            &UploadOptions::default().with_content_type("text/plain"),
        )
        .await?;

    let to_delete: Vec<String> = store
        .list(prefix)
        .await?
        .into_iter()
        .filter(|object| !object.is_dir && object.name != KEEP_FILE)
        .map(|object| format!("{}/{}", prefix, object.name))
        .collect();

    if to_delete.is_empty() {
        log::info!("Nothing to clean up under {}/", prefix);
        return Ok(CleanupReport {
            message: "No files to clean up".to_string(),
            deleted_files: Vec::new(),
        });
    }

    store.remove(&to_delete).await?;
    log::info!("Removed {} file(s) from {}/", to_delete.len(), prefix);

    Ok(CleanupReport {
        message: format!("Successfully cleaned up {} files", to_delete.len()),
        deleted_files: to_delete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryObjectStore, UPLOADS_PREFIX};

    #[tokio::test]
    async fn test_cleanup_on_empty_folder_creates_keep() {
        let store = InMemoryObjectStore::default();

        let report = cleanup_uploads(&store, UPLOADS_PREFIX).await.unwrap();

        assert_eq!(report.message, "No files to clean up");
        assert!(report.deleted_files.is_empty());
        assert_eq!(store.keys(), vec!["uploads/.keep".to_string()]);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_placeholder_and_folders() {
        let store = InMemoryObjectStore::default();
        let options = UploadOptions::default();
        for key in ["uploads/a.pdf", "uploads/b.pdf", "uploads/archive/c.pdf", "other/d.pdf"] {
            store.upload(key, vec![1], &options).await.unwrap();
        }

        let report = cleanup_uploads(&store, UPLOADS_PREFIX).await.unwrap();

        assert_eq!(report.message, "Successfully cleaned up 2 files");
        assert_eq!(
            report.deleted_files,
            vec!["uploads/a.pdf".to_string(), "uploads/b.pdf".to_string()]
        );
        assert_eq!(
            store.keys(),
            vec![
                "other/d.pdf".to_string(),
                "uploads/.keep".to_string(),
                "uploads/archive/c.pdf".to_string(),
            ]
        );
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = CleanupReport {
            message: "m".to_string(),
            deleted_files: vec!["uploads/a.pdf".to_string()],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["deletedFiles"][0], "uploads/a.pdf");
    }
}
