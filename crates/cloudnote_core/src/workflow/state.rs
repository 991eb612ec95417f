//! Per-save state machine: `Idle -> Validating -> (Uploading) ->
//! Persisting -> Done | Failed`.

use crate::workflow::WorkflowError;
use log::{debug, warn};
use std::sync::Arc;

/// Observer invoked on every save state transition.
pub type StateListener = Arc<dyn Fn(SaveOperation, SaveState) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOperation {
    Create,
    Update,
}

impl SaveOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Validating,
    Uploading,
    Persisting,
    Done,
    Failed,
}

impl SaveState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Uploading => "uploading",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Tracks one save; starts in `Idle`, which is not reported.
pub(crate) struct SaveRun<'a> {
    operation: SaveOperation,
    state: SaveState,
    listener: Option<&'a StateListener>,
}

impl<'a> SaveRun<'a> {
    pub(crate) fn new(operation: SaveOperation, listener: Option<&'a StateListener>) -> Self {
        Self {
            operation,
            state: SaveState::Idle,
            listener,
        }
    }

    pub(crate) fn enter(&mut self, next: SaveState) {
        if self.state.is_terminal() {
            warn!(
                "event=save_state module=workflow op={} status=error reason=already_finished to={}",
                self.operation.as_str(),
                next.as_str()
            );
            return;
        }
        debug!(
            "event=save_state module=workflow op={} from={} to={}",
            self.operation.as_str(),
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
        if let Some(listener) = self.listener {
            (**listener)(self.operation, next);
        }
    }

    /// Moves to `Failed` and hands the error back for propagation.
    pub(crate) fn fail(&mut self, err: WorkflowError) -> WorkflowError {
        let failed_in = self.state;
        self.enter(SaveState::Failed);
        warn!(
            "event=note_save module=workflow op={} status=error stage={} category={}",
            self.operation.as_str(),
            failed_in.as_str(),
            err.category()
        );
        err
    }
}
