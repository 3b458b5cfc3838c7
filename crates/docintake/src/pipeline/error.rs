use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("A run is already in progress")]
    AlreadyRunning,

    #[error("No acceptable file to process")]
    EmptyBatch,

    #[error("Failed to read '{name}': {source}")]
    ReadSource {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File name cannot be empty")]
    EmptyName,

    #[error("Index {index} is out of range (batch has {len} files)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("'{file}' was not stored, no preview available")]
    PreviewUnavailable { file: String },
}

/// Something went wrong for one file but the run carried on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineWarning {
    #[error("'{file}' kept its original name: {error}")]
    RenameFellBack { file: String, error: String },

    #[error("Upload of '{file}' as '{key}' failed, falling back to the original name: {error}")]
    UploadFellBack {
        file: String,
        key: String,
        error: String,
    },

    #[error("'{file}' was not stored: {error}")]
    NotStored { file: String, error: String },

    #[error("History entry not saved: {error}")]
    HistoryWriteFailed { error: String },
}
