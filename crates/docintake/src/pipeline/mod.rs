//! Rename and classify runs over a batch of documents.

pub mod batch;
pub mod config;
pub mod error;
pub mod intake;
pub mod progress;
pub mod runner;
pub mod state;

pub use batch::{ClassifyItem, ReviewBatch};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineWarning};
pub use intake::{filter_accepted, Intake, ACCEPTED_MEDIA_TYPE};
pub use progress::{BroadcastProgress, NoopProgress, ProgressEvent, ProgressReporter, Stage};
pub use runner::{ClassifyFailure, ClassifyOutcome, Pipeline, RenameOutcome};
pub use state::{RunGuard, RunState, RunStateMachine};
