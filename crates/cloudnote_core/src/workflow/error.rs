use crate::error::ErrorCategory;
use crate::image::UploadError;
use crate::model::note::NoteValidationError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Terminal failure of one workflow operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    Validation(NoteValidationError),
    Upload(UploadError),
    Store(StoreError),
}

impl WorkflowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Upload(err) => err.category(),
            Self::Store(err) => err.category(),
        }
    }
}

impl Display for WorkflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "please fill in the note: {err}"),
            Self::Upload(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "note storage failed: {err}"),
        }
    }
}

impl Error for WorkflowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Upload(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<NoteValidationError> for WorkflowError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<UploadError> for WorkflowError {
    fn from(value: UploadError) -> Self {
        Self::Upload(value)
    }
}

impl From<StoreError> for WorkflowError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
