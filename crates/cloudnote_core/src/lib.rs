//! Core domain logic for CloudNote.
//! Owns the note save/sync workflow and its image host and document store
//! clients; UI layers call in through `cloudnote_ffi`.

pub mod config;
pub mod error;
pub mod image;
pub mod logging;
pub mod model;
pub mod store;
pub mod workflow;

pub use config::{CloudNoteConfig, ConfigError, DocumentStoreConfig, ImageHostConfig};
pub use error::ErrorCategory;
pub use image::{ImageUploader, ImgurUploader, UploadError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::image::PendingImage;
pub use model::note::{
    validate_note_text, Note, NoteDraft, NoteFields, NoteId, NoteSnapshot, NoteValidationError,
};
pub use store::{
    FirestoreNoteStore, MemoryNoteStore, NoteStore, StoreError, StoreErrorKind, StoreResult,
    Subscription,
};
pub use workflow::{NoteWorkflow, SaveOperation, SaveState, StateListener, WorkflowError};

/// Workflow wired to the production clients.
pub type CloudNoteWorkflow = NoteWorkflow<FirestoreNoteStore, ImgurUploader>;

/// Builds the production workflow from validated settings.
pub fn build_workflow(config: &CloudNoteConfig) -> Result<CloudNoteWorkflow, ConfigError> {
    config.validate()?;
    let store = FirestoreNoteStore::new(&config.document_store)?;
    let uploader = ImgurUploader::new(&config.image_host)?;
    Ok(NoteWorkflow::new(store, uploader))
}

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
