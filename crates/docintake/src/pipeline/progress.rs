use serde::Serialize;
use tokio::sync::broadcast;

/// Which of the two user-triggered runs an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Rename,
    Classify,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Rename => write!(f, "rename"),
            Stage::Classify => write!(f, "classify"),
        }
    }
}

/// Events emitted while a run is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ProgressEvent {
    #[serde(rename_all = "camelCase")]
    FileStarted {
        stage: Stage,
        index: usize,
        total: usize,
        file: String,
    },
    #[serde(rename_all = "camelCase")]
    RetryScheduled {
        stage: Stage,
        file: String,
        attempt: u32,
        retries_left: u32,
        error: String,
    },
    FileRenamed {
        index: usize,
        file: String,
        #[serde(rename = "newName")]
        new_name: String,
    },
    FellBack {
        index: usize,
        file: String,
        error: String,
    },
    Uploaded {
        file: String,
        path: String,
    },
    UploadFailed {
        file: String,
        key: String,
        error: String,
    },
    FileClassified {
        index: usize,
        file: String,
        message: String,
    },
    Completed {
        stage: Stage,
        files: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Failed {
        stage: Stage,
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Fans events out to any number of subscribers (UI notifications).
#[derive(Clone)]
pub struct BroadcastProgress {
    sender: broadcast::Sender<ProgressEvent>,
}

impl BroadcastProgress {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastProgress {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        // No subscriber is fine.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_delivers_to_subscribers() {
        let progress = BroadcastProgress::default();
        let mut rx = progress.subscribe();

        progress.report(ProgressEvent::Completed {
            stage: Stage::Rename,
            files: 2,
            message: None,
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ProgressEvent::Completed { files: 2, .. }));
    }

    #[test]
    fn test_report_without_subscribers_is_silent() {
        BroadcastProgress::new(4).report(ProgressEvent::Failed {
            stage: Stage::Classify,
            error: "boom".to_string(),
        });
    }

    #[test]
    fn test_events_serialize_tagged() {
        let json = serde_json::to_value(ProgressEvent::RetryScheduled {
            stage: Stage::Rename,
            file: "scan.pdf".to_string(),
            attempt: 1,
            retries_left: 3,
            error: "HTTP Error 502".to_string(),
        })
        .unwrap();

        assert_eq!(json["event"], "retryScheduled");
        assert_eq!(json["stage"], "rename");
        assert_eq!(json["retriesLeft"], 3);
    }
}
