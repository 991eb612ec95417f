//! Note domain model.
//!
//! # Responsibility
//! - Define the document shape stored in the `notes` collection.
//! - Reject blank title/content before the workflow touches the network.
//!
//! # Invariants
//! - `NoteId` is assigned by the document store and never edited locally.
//! - A note is never persisted with a blank title or blank content.
//! - A `NoteSnapshot` is a full collection delivery, never a delta.

use crate::model::image::PendingImage;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque document identifier assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Text validation failure raised before any I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    BlankTitle,
    BlankContent,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "note title must not be blank"),
            Self::BlankContent => write!(f, "note content must not be blank"),
        }
    }
}

impl Error for NoteValidationError {}

/// Field set of one note document.
///
/// Serialized with the document field names used by the `notes`
/// collection (`title`, `content`, `imagePath`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFields {
    pub title: String,
    pub content: String,
    /// Durable image URL, or empty when no image is attached.
    #[serde(rename = "imagePath", default)]
    pub image_path: String,
}

impl NoteFields {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        image_path: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image_path: image_path.into(),
        }
    }

    /// Returns whether an image URL is attached.
    pub fn has_image(&self) -> bool {
        !self.image_path.is_empty()
    }

    /// Validates text fields against the persistence rules.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_note_text(&self.title, &self.content)
    }
}

/// Checks that both title and content contain non-whitespace text.
///
/// Title is checked first so callers get a stable error for fully empty
/// forms.
pub fn validate_note_text(title: &str, content: &str) -> Result<(), NoteValidationError> {
    if title.trim().is_empty() {
        return Err(NoteValidationError::BlankTitle);
    }
    if content.trim().is_empty() {
        return Err(NoteValidationError::BlankContent);
    }
    Ok(())
}

/// Persisted note as delivered by a store snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    #[serde(flatten)]
    pub fields: NoteFields,
}

impl Note {
    pub fn new(id: NoteId, fields: NoteFields) -> Self {
        Self { id, fields }
    }

    pub fn title(&self) -> &str {
        &self.fields.title
    }

    pub fn content(&self) -> &str {
        &self.fields.content
    }

    pub fn image_path(&self) -> &str {
        &self.fields.image_path
    }
}

/// Caller input for one create/update save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    /// Newly selected image; `None` keeps whatever is already attached.
    pub image: Option<PendingImage>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: PendingImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_note_text(&self.title, &self.content)
    }
}

/// Full-collection delivery from a live subscription.
///
/// Document order is store-defined and may differ between deliveries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteSnapshot {
    notes: Vec<Note>,
}

impl NoteSnapshot {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }
}
