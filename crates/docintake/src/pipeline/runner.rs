use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::history::{HistoryStatus, HistoryStore, NewHistoryEntry};
use crate::model::{FileEntry, FilePayload, SourceFile};
use crate::remote::{RemoteError, RenameService};
use crate::retry::{FailedAttempt, RetryObserver, RetryPolicy};
use crate::sanitize;
use crate::storage::{object_key, ObjectStore, StorageError, UploadOptions};

use super::batch::{ClassifyItem, ReviewBatch};
use super::config::PipelineConfig;
use super::error::{PipelineError, PipelineWarning};
use super::intake::filter_accepted;
use super::progress::{ProgressEvent, ProgressReporter, Stage};
use super::state::{RunState, RunStateMachine};

/// Separator between per-file classification messages.
const MESSAGE_SEPARATOR: &str = " | ";

/// Result of a rename run.
#[derive(Debug)]
pub struct RenameOutcome {
    /// False only when the run itself failed (unreadable source).
    pub success: bool,
    /// One item per accepted file, in input order.
    pub items: Vec<ClassifyItem>,
    /// Names of the files turned away before the run.
    pub rejected: Vec<String>,
    pub error: Option<String>,
    pub warnings: Vec<PipelineWarning>,
    pub history_id: Option<String>,
}

impl RenameOutcome {
    pub fn entries(&self) -> Vec<FileEntry> {
        self.items.iter().map(|item| item.entry.clone()).collect()
    }

    pub fn into_batch(self) -> ReviewBatch {
        ReviewBatch::new(self.items)
    }
}

/// The file that stopped a classify run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyFailure {
    pub index: usize,
    pub file: String,
    pub error: String,
}

/// Result of a classify run.
#[derive(Debug)]
pub struct ClassifyOutcome {
    pub success: bool,
    /// Per-file messages joined with `" | "`, on success.
    pub message: Option<String>,
    /// Messages of the files classified before any failure.
    pub messages: Vec<String>,
    pub failure: Option<ClassifyFailure>,
    pub warnings: Vec<PipelineWarning>,
    pub history_id: Option<String>,
}

/// Forwards failed attempts to the progress reporter.
struct ProgressRetryObserver<'a> {
    stage: Stage,
    file: &'a str,
    progress: &'a dyn ProgressReporter,
}

impl RetryObserver for ProgressRetryObserver<'_> {
    fn on_failed_attempt(&self, attempt: &FailedAttempt<'_>) {
        if attempt.retries_left > 0 {
            self.progress.report(ProgressEvent::RetryScheduled {
                stage: self.stage,
                file: self.file.to_string(),
                attempt: attempt.attempt_number,
                retries_left: attempt.retries_left,
                error: attempt.error.to_string(),
            });
        }
    }
}

/// Sequential rename and classify runs over a batch of documents.
pub struct Pipeline {
    config: PipelineConfig,
    retry: RetryPolicy,
    remote: Arc<dyn RenameService>,
    store: Arc<dyn ObjectStore>,
    history: Arc<dyn HistoryStore>,
    state: RunStateMachine,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        retry: RetryPolicy,
        remote: Arc<dyn RenameService>,
        store: Arc<dyn ObjectStore>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            config,
            retry,
            remote,
            store,
            history,
            state: RunStateMachine::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run_state(&self) -> RunState {
        self.state.current()
    }

    /// Renames and uploads every file, one after the other.
    ///
    /// Files that are not PDFs are skipped and listed in `rejected`. A file
    /// the service cannot rename keeps its original name and is still
    /// uploaded. Only an unreadable source aborts the run.
    pub async fn rename(
        &self,
        files: Vec<SourceFile>,
        progress: &dyn ProgressReporter,
    ) -> Result<RenameOutcome, PipelineError> {
        let intake = filter_accepted(files);
        if intake.accepted.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }
        let guard = self.state.try_start()?;

        let span = info_span!(
            "rename_run",
            files = intake.accepted.len(),
            rejected = intake.rejected_count()
        );
        let mut outcome = self
            .rename_files(intake.accepted, progress)
            .instrument(span)
            .await;
        outcome.rejected = intake.rejected;

        if outcome.success {
            guard.complete();
        } else {
            guard.fail();
        }
        Ok(outcome)
    }

    async fn rename_files(
        &self,
        files: Vec<SourceFile>,
        progress: &dyn ProgressReporter,
    ) -> RenameOutcome {
        let total = files.len();
        let names: Vec<String> = files.iter().map(|f| f.name().to_string()).collect();
        let mut items = Vec::with_capacity(total);
        let mut warnings = Vec::new();
        let mut failure = None;

        let mut remaining = files.into_iter().enumerate();
        for (index, file) in remaining.by_ref() {
            if index > 0 {
                self.pace().await;
            }
            progress.report(ProgressEvent::FileStarted {
                stage: Stage::Rename,
                index,
                total,
                file: file.name().to_string(),
            });

            let span = info_span!(
                "rename_file",
                index,
                file = %sanitize::redact_path(Path::new(file.name()))
            );
            match self
                .rename_one(index, &file, progress, &mut warnings)
                .instrument(span)
                .await
            {
                Ok(entry) => items.push(ClassifyItem::new(file, entry)),
                Err(e) => {
                    let entry = FileEntry::unrenamed(file.name());
                    items.push(ClassifyItem::new(file, entry));
                    failure = Some(e);
                    break;
                }
            }
        }
        for (_, file) in remaining {
            let entry = FileEntry::unrenamed(file.name());
            items.push(ClassifyItem::new(file, entry));
        }

        match failure {
            None => {
                let entries: Vec<FileEntry> = items.iter().map(|i| i.entry.clone()).collect();
                let history_id = self
                    .record(NewHistoryEntry::new(entries, HistoryStatus::Success), &mut warnings)
                    .await;
                info!(
                    "Rename run finished: {} file(s), {} warning(s)",
                    total,
                    warnings.len()
                );
                progress.report(ProgressEvent::Completed {
                    stage: Stage::Rename,
                    files: total,
                    message: None,
                });
                RenameOutcome {
                    success: true,
                    items,
                    rejected: Vec::new(),
                    error: None,
                    warnings,
                    history_id,
                }
            }
            Some(e) => {
                let error = e.to_string();
                warn!("Rename run aborted: {}", error);
                let entries = names.into_iter().map(FileEntry::unrenamed).collect();
                let history_id = self
                    .record(NewHistoryEntry::new(entries, HistoryStatus::Error), &mut warnings)
                    .await;
                progress.report(ProgressEvent::Failed {
                    stage: Stage::Rename,
                    error: error.clone(),
                });
                RenameOutcome {
                    success: false,
                    items,
                    rejected: Vec::new(),
                    error: Some(error),
                    warnings,
                    history_id,
                }
            }
        }
    }

    async fn rename_one(
        &self,
        index: usize,
        file: &SourceFile,
        progress: &dyn ProgressReporter,
        warnings: &mut Vec<PipelineWarning>,
    ) -> Result<FileEntry, PipelineError> {
        let name = file.name().to_string();
        let payload = file
            .load()
            .await
            .map_err(|source| PipelineError::ReadSource {
                name: name.clone(),
                source,
            })?;

        let observer = ProgressRetryObserver {
            stage: Stage::Rename,
            file: &name,
            progress,
        };
        let label = format!("rename '{}'", name);
        let result = self
            .retry
            .run_if(&label, &observer, RemoteError::is_retryable, || {
                self.remote.rename(&payload)
            })
            .await;

        match result {
            Ok(suggestion) => {
                debug!("'{}' renamed to '{}'", name, suggestion.new_name);
                progress.report(ProgressEvent::FileRenamed {
                    index,
                    file: name.clone(),
                    new_name: suggestion.new_name.clone(),
                });
                let storage_path = self
                    .upload_with_fallback(&payload, Some(&suggestion.new_name), progress, warnings)
                    .await;
                Ok(FileEntry::new(name, suggestion.new_name)
                    .with_storage_path(storage_path)
                    .with_document_type(suggestion.document_type))
            }
            Err(e) => {
                let error = e.to_string();
                warn!("{}", error);
                progress.report(ProgressEvent::FellBack {
                    index,
                    file: name.clone(),
                    error: error.clone(),
                });
                warnings.push(PipelineWarning::RenameFellBack {
                    file: name.clone(),
                    error,
                });
                let storage_path = self
                    .upload_with_fallback(&payload, None, progress, warnings)
                    .await;
                Ok(FileEntry::unrenamed(name).with_storage_path(storage_path))
            }
        }
    }

    /// Uploads under the suggested name, else under the original one.
    /// Returns the key the file ended up under, if any.
    async fn upload_with_fallback(
        &self,
        payload: &FilePayload,
        suggested: Option<&str>,
        progress: &dyn ProgressReporter,
        warnings: &mut Vec<PipelineWarning>,
    ) -> Option<String> {
        let options = UploadOptions::default().with_content_type(payload.media_type.clone());

        if let Some(new_name) = suggested {
            match self.upload_as(new_name, payload, &options).await {
                Ok(path) => {
                    progress.report(ProgressEvent::Uploaded {
                        file: payload.name.clone(),
                        path: path.clone(),
                    });
                    return Some(path);
                }
                Err(e) => {
                    warn!("Upload of '{}' as '{}' failed: {}", payload.name, new_name, e);
                    progress.report(ProgressEvent::UploadFailed {
                        file: payload.name.clone(),
                        key: new_name.to_string(),
                        error: e.to_string(),
                    });
                    warnings.push(PipelineWarning::UploadFellBack {
                        file: payload.name.clone(),
                        key: new_name.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        match self.upload_as(&payload.name, payload, &options).await {
            Ok(path) => {
                progress.report(ProgressEvent::Uploaded {
                    file: payload.name.clone(),
                    path: path.clone(),
                });
                Some(path)
            }
            Err(e) => {
                warn!("Upload of '{}' failed: {}", payload.name, e);
                progress.report(ProgressEvent::UploadFailed {
                    file: payload.name.clone(),
                    key: payload.name.clone(),
                    error: e.to_string(),
                });
                warnings.push(PipelineWarning::NotStored {
                    file: payload.name.clone(),
                    error: e.to_string(),
                });
                None
            }
        }
    }

    async fn upload_as(
        &self,
        name: &str,
        payload: &FilePayload,
        options: &UploadOptions,
    ) -> Result<String, StorageError> {
        let key = object_key(&self.config.prefix, name)?;
        self.store
            .upload(&key, payload.bytes.clone(), options)
            .await
    }

    /// Asks the service to file each document. Stops at the first failure;
    /// later files are not sent.
    pub async fn classify(
        &self,
        batch: &ReviewBatch,
        progress: &dyn ProgressReporter,
    ) -> Result<ClassifyOutcome, PipelineError> {
        if batch.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }
        let guard = self.state.try_start()?;

        let span = info_span!("classify_run", files = batch.len());
        let outcome = self.classify_items(batch, progress).instrument(span).await;

        if outcome.success {
            guard.complete();
        } else {
            guard.fail();
        }
        Ok(outcome)
    }

    async fn classify_items(
        &self,
        batch: &ReviewBatch,
        progress: &dyn ProgressReporter,
    ) -> ClassifyOutcome {
        let total = batch.len();
        let mut messages = Vec::with_capacity(total);
        let mut warnings = Vec::new();
        let mut failure = None;

        for (index, item) in batch.items().iter().enumerate() {
            if index > 0 {
                self.pace().await;
            }
            let name = item.entry.original.clone();
            progress.report(ProgressEvent::FileStarted {
                stage: Stage::Classify,
                index,
                total,
                file: name.clone(),
            });

            let span = info_span!(
                "classify_file",
                index,
                file = %sanitize::redact_path(Path::new(&name))
            );
            match self.classify_one(item, progress).instrument(span).await {
                Ok(message) => {
                    progress.report(ProgressEvent::FileClassified {
                        index,
                        file: name,
                        message: message.clone(),
                    });
                    messages.push(message);
                }
                Err(error) => {
                    warn!("Classification of '{}' failed: {}", name, error);
                    failure = Some(ClassifyFailure {
                        index,
                        file: name,
                        error,
                    });
                    break;
                }
            }
        }

        let entries = batch.entries();
        match failure {
            None => {
                let message = messages.join(MESSAGE_SEPARATOR);
                let history_id = self
                    .record(
                        NewHistoryEntry::new(entries, HistoryStatus::Classified)
                            .with_message(message.clone()),
                        &mut warnings,
                    )
                    .await;
                info!("Classify run finished: {} file(s)", total);
                progress.report(ProgressEvent::Completed {
                    stage: Stage::Classify,
                    files: total,
                    message: Some(message.clone()),
                });
                ClassifyOutcome {
                    success: true,
                    message: Some(message),
                    messages,
                    failure: None,
                    warnings,
                    history_id,
                }
            }
            Some(failure) => {
                let history_id = self
                    .record(NewHistoryEntry::new(entries, HistoryStatus::Error), &mut warnings)
                    .await;
                progress.report(ProgressEvent::Failed {
                    stage: Stage::Classify,
                    error: format!("{}: {}", failure.file, failure.error),
                });
                ClassifyOutcome {
                    success: false,
                    message: None,
                    messages,
                    failure: Some(failure),
                    warnings,
                    history_id,
                }
            }
        }
    }

    async fn classify_one(
        &self,
        item: &ClassifyItem,
        progress: &dyn ProgressReporter,
    ) -> Result<String, String> {
        let entry = &item.entry;
        let payload = item.file.load().await.map_err(|source| {
            PipelineError::ReadSource {
                name: entry.original.clone(),
                source,
            }
            .to_string()
        })?;

        let observer = ProgressRetryObserver {
            stage: Stage::Classify,
            file: &entry.original,
            progress,
        };
        let label = format!("classify '{}'", entry.renamed);
        self.retry
            .run_if(&label, &observer, RemoteError::is_retryable, || {
                self.remote.classify(
                    &payload,
                    &entry.renamed,
                    entry.document_type.as_deref(),
                    Some(&entry.original),
                )
            })
            .await
            .map_err(|e| e.to_string())
    }

    /// Writes a history entry. A failed write is a warning, not a run failure.
    async fn record(
        &self,
        entry: NewHistoryEntry,
        warnings: &mut Vec<PipelineWarning>,
    ) -> Option<String> {
        match self.history.insert(entry).await {
            Ok(stored) => Some(stored.id),
            Err(e) => {
                warn!("Failed to write history entry: {}", e);
                warnings.push(PipelineWarning::HistoryWriteFailed {
                    error: e.to_string(),
                });
                None
            }
        }
    }

    async fn pace(&self) {
        if !self.config.pacing_delay.is_zero() {
            tokio::time::sleep(self.config.pacing_delay).await;
        }
    }
}
