//! Document store contracts for the `notes` collection.
//!
//! # Responsibility
//! - Define the create/update/delete/subscribe contract the workflow uses.
//! - Provide an in-process store and a Firestore REST store.
//!
//! # Invariants
//! - `create` never overwrites an existing document.
//! - `update` fails when the id does not reference an existing document.
//! - `delete` of a missing id is reported as success.
//! - Subscriptions deliver full snapshots, never deltas.
//! - Store errors are always returned to the caller and never retried here.

mod firestore;
mod memory;
mod subscription;

use crate::error::ErrorCategory;
use crate::model::note::{NoteFields, NoteId};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use firestore::FirestoreNoteStore;
pub use memory::MemoryNoteStore;
pub use subscription::Subscription;

pub type StoreResult<T> = Result<T, StoreError>;

/// Diagnostic class of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Referenced document does not exist.
    NotFound,
    /// Request could not reach the store.
    Transport,
    /// Store refused the request (permissions, quota, bad input).
    Rejected,
    /// Store answered with a body that could not be decoded.
    InvalidResponse,
}

/// Document store rejection with a user-displayable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(id: &NoteId) -> Self {
        Self::new(StoreErrorKind::NotFound, format!("note `{id}` does not exist"))
    }

    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Store
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for StoreError {}

/// Remote collection of note documents keyed by store-assigned ids.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Persists a new document and returns its assigned id.
    async fn create(&self, fields: &NoteFields) -> StoreResult<NoteId>;
    /// Replaces title, content and image path of an existing document.
    async fn update(&self, id: &NoteId, fields: &NoteFields) -> StoreResult<()>;
    /// Removes a document; missing ids succeed.
    async fn delete(&self, id: &NoteId) -> StoreResult<()>;
    /// Opens a live feed of full collection snapshots.
    async fn subscribe(&self) -> StoreResult<Subscription>;
}

#[async_trait]
impl<T: NoteStore + ?Sized> NoteStore for std::sync::Arc<T> {
    async fn create(&self, fields: &NoteFields) -> StoreResult<NoteId> {
        (**self).create(fields).await
    }

    async fn update(&self, id: &NoteId, fields: &NoteFields) -> StoreResult<()> {
        (**self).update(id, fields).await
    }

    async fn delete(&self, id: &NoteId) -> StoreResult<()> {
        (**self).delete(id).await
    }

    async fn subscribe(&self) -> StoreResult<Subscription> {
        (**self).subscribe().await
    }
}
