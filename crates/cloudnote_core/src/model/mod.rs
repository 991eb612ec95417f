//! Domain model for notes and their image attachments.
//!
//! # Responsibility
//! - Define the canonical note shapes shared by stores and the workflow.
//! - Own the text validation rules applied before any network call.
//!
//! # Invariants
//! - Every persisted note is identified by one store-assigned `NoteId`.
//! - `image_path` is never null; "no image" is the empty string.

pub mod image;
pub mod note;
