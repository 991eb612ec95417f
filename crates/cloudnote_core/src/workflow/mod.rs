//! Note save/delete/list orchestration.
//!
//! # Responsibility
//! - Validate user input before any I/O.
//! - Upload a newly selected image before persisting the note document.
//! - Expose the live note list as a snapshot subscription.
//!
//! # Invariants
//! - Upload strictly precedes persist within one save; a failed upload
//!   means no document write.
//! - An update without a new image persists the known `image_path`
//!   unchanged.
//! - A failed persist after a successful upload is not rolled back; the
//!   uploaded image stays on the host unreferenced.
//! - Delete never talks to the image host.

mod error;
mod state;

use crate::image::ImageUploader;
use crate::model::note::{Note, NoteDraft, NoteFields, NoteId};
use crate::store::{NoteStore, Subscription};
use log::{info, warn};
use state::SaveRun;
use std::sync::Arc;

pub use error::WorkflowError;
pub use state::{SaveOperation, SaveState, StateListener};

/// Use-case facade over an injected note store and image uploader.
///
/// All operations take `&self`; independent saves and deletes may run
/// concurrently and are not ordered relative to each other.
pub struct NoteWorkflow<S: NoteStore, U: ImageUploader> {
    store: S,
    uploader: U,
    state_listener: Option<StateListener>,
}

impl<S: NoteStore, U: ImageUploader> NoteWorkflow<S, U> {
    pub fn new(store: S, uploader: U) -> Self {
        Self {
            store,
            uploader,
            state_listener: None,
        }
    }

    /// Registers an observer for save state transitions (UI progress).
    pub fn with_state_listener(
        mut self,
        listener: impl Fn(SaveOperation, SaveState) + Send + Sync + 'static,
    ) -> Self {
        self.state_listener = Some(Arc::new(listener));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Splits the workflow back into its collaborators.
    pub fn into_parts(self) -> (S, U) {
        (self.store, self.uploader)
    }

    /// Creates a note, uploading the selected image first when present.
    ///
    /// # Errors
    /// - `WorkflowError::Validation` for blank title/content (no I/O).
    /// - `WorkflowError::Upload` when the image cannot be read or uploaded;
    ///   nothing is written to the store.
    /// - `WorkflowError::Store` when the document write fails.
    pub async fn create_note(&self, draft: NoteDraft) -> Result<NoteId, WorkflowError> {
        let mut run = SaveRun::new(SaveOperation::Create, self.state_listener.as_ref());
        let (fields, uploaded) = self.prepare(&mut run, draft, "").await?;

        run.enter(SaveState::Persisting);
        match self.store.create(&fields).await {
            Ok(id) => {
                run.enter(SaveState::Done);
                info!(
                    "event=note_save module=workflow op=create status=ok id={id} image={}",
                    fields.has_image()
                );
                Ok(id)
            }
            Err(err) => {
                if uploaded {
                    log_orphaned_image(SaveOperation::Create, &fields.image_path);
                }
                Err(run.fail(WorkflowError::Store(err)))
            }
        }
    }

    /// Updates an existing note.
    ///
    /// `current_image_path` is the image URL the caller last saw for this
    /// note; it is persisted unchanged unless `draft.image` is set.
    ///
    /// # Errors
    /// - Same classes as `create_note`; `WorkflowError::Store` also covers
    ///   ids that no longer exist.
    pub async fn update_note(
        &self,
        id: &NoteId,
        current_image_path: &str,
        draft: NoteDraft,
    ) -> Result<(), WorkflowError> {
        let mut run = SaveRun::new(SaveOperation::Update, self.state_listener.as_ref());
        let (fields, uploaded) = self.prepare(&mut run, draft, current_image_path).await?;

        run.enter(SaveState::Persisting);
        match self.store.update(id, &fields).await {
            Ok(()) => {
                run.enter(SaveState::Done);
                info!(
                    "event=note_save module=workflow op=update status=ok id={id} new_image={uploaded}"
                );
                Ok(())
            }
            Err(err) => {
                if uploaded {
                    log_orphaned_image(SaveOperation::Update, &fields.image_path);
                }
                Err(run.fail(WorkflowError::Store(err)))
            }
        }
    }

    /// Updates a note from a snapshot entry, keeping its image by default.
    pub async fn update_existing(&self, note: &Note, draft: NoteDraft) -> Result<(), WorkflowError> {
        self.update_note(&note.id, note.image_path(), draft).await
    }

    /// Deletes a note document. Any attached image stays on the host.
    pub async fn delete_note(&self, id: &NoteId) -> Result<(), WorkflowError> {
        match self.store.delete(id).await {
            Ok(()) => {
                info!("event=note_delete module=workflow status=ok id={id}");
                Ok(())
            }
            Err(err) => {
                warn!("event=note_delete module=workflow status=error id={id}");
                Err(WorkflowError::Store(err))
            }
        }
    }

    /// Opens the live note list.
    pub async fn list_notes(&self) -> Result<Subscription, WorkflowError> {
        self.store.subscribe().await.map_err(WorkflowError::Store)
    }

    // Runs Validating and, when an image was selected, Uploading. Returns
    // the fields to persist and whether a fresh upload produced the URL.
    async fn prepare(
        &self,
        run: &mut SaveRun<'_>,
        draft: NoteDraft,
        known_image_path: &str,
    ) -> Result<(NoteFields, bool), WorkflowError> {
        run.enter(SaveState::Validating);
        if let Err(err) = draft.validate() {
            return Err(run.fail(WorkflowError::Validation(err)));
        }

        let NoteDraft {
            title,
            content,
            image,
        } = draft;

        let (image_path, uploaded) = match image {
            Some(image) => {
                run.enter(SaveState::Uploading);
                match self.uploader.upload(&image).await {
                    Ok(url) => (url, true),
                    Err(err) => return Err(run.fail(WorkflowError::Upload(err))),
                }
            }
            None => (known_image_path.to_string(), false),
        };

        Ok((NoteFields::new(title, content, image_path), uploaded))
    }
}

fn log_orphaned_image(operation: SaveOperation, url: &str) {
    warn!(
        "event=image_orphaned module=workflow op={} url={url}",
        operation.as_str()
    );
}
