//! Single-run guard for a pipeline.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use super::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// `Idle -> Running -> Completed | Failed`, and back to `Running` on the
/// next start. Only one run at a time.
#[derive(Debug, Clone, Default)]
pub struct RunStateMachine {
    state: Arc<Mutex<RunState>>,
}

impl RunStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.current() == RunState::Running
    }

    /// Moves to `Running`. The returned guard ends the run.
    pub fn try_start(&self) -> Result<RunGuard, PipelineError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == RunState::Running {
            return Err(PipelineError::AlreadyRunning);
        }
        *state = RunState::Running;
        Ok(RunGuard {
            state: Arc::clone(&self.state),
            finished: false,
        })
    }
}

/// Ends the run it was created for. Dropped without
/// [`complete`](RunGuard::complete) or [`fail`](RunGuard::fail), the run is
/// marked failed.
#[derive(Debug)]
pub struct RunGuard {
    state: Arc<Mutex<RunState>>,
    finished: bool,
}

impl RunGuard {
    pub fn complete(mut self) {
        self.finish(RunState::Completed);
    }

    pub fn fail(mut self) {
        self.finish(RunState::Failed);
    }

    fn finish(&mut self, to: RunState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = to;
        self.finished = true;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.finish(RunState::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let machine = RunStateMachine::new();
        assert_eq!(machine.current(), RunState::Idle);

        let guard = machine.try_start().unwrap();
        assert!(machine.is_running());
        guard.complete();
        assert_eq!(machine.current(), RunState::Completed);

        machine.try_start().unwrap().fail();
        assert_eq!(machine.current(), RunState::Failed);
    }

    #[test]
    fn test_second_start_is_refused() {
        let machine = RunStateMachine::new();
        let _guard = machine.try_start().unwrap();

        assert!(matches!(
            machine.clone().try_start(),
            Err(PipelineError::AlreadyRunning)
        ));
    }

    #[test]
    fn test_dropped_guard_marks_failed() {
        let machine = RunStateMachine::new();
        {
            let _guard = machine.try_start().unwrap();
        }
        assert_eq!(machine.current(), RunState::Failed);
        assert!(machine.try_start().is_ok());
    }
}
