//! In-process note store.
//!
//! Keeps the collection in insertion order and broadcasts a full snapshot
//! after every committed write. Serves as the substitute store for tests,
//! the CLI smoke check, and embedders that bring their own sync.

use crate::model::note::{Note, NoteFields, NoteId, NoteSnapshot};
use crate::store::{NoteStore, StoreError, StoreResult, Subscription};
use async_trait::async_trait;
use log::info;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use uuid::Uuid;

/// Shared handle to an in-memory `notes` collection; clones see the same
/// documents.
#[derive(Clone)]
pub struct MemoryNoteStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    notes: Mutex<Vec<Note>>,
    snapshots: watch::Sender<Option<NoteSnapshot>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::with_notes(Vec::new())
    }

    /// Seeds the collection with existing documents.
    pub fn with_notes(notes: Vec<Note>) -> Self {
        let (snapshots, _) = watch::channel(Some(NoteSnapshot::new(notes.clone())));
        Self {
            inner: Arc::new(MemoryInner {
                notes: Mutex::new(notes),
                snapshots,
            }),
        }
    }

    /// Returns the current collection contents.
    pub fn snapshot(&self) -> NoteSnapshot {
        NoteSnapshot::new(self.lock().clone())
    }

    pub fn get(&self, id: &NoteId) -> Option<Note> {
        self.lock().iter().find(|note| &note.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Note>> {
        self.inner
            .notes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // Publishing under the lock keeps snapshot order equal to write order.
    fn publish(&self, notes: &[Note]) {
        self.inner
            .snapshots
            .send_replace(Some(NoteSnapshot::new(notes.to_vec())));
    }
}

impl Default for MemoryNoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn create(&self, fields: &NoteFields) -> StoreResult<NoteId> {
        let mut notes = self.lock();
        let id = loop {
            let candidate = NoteId::new(Uuid::new_v4().simple().to_string());
            if !notes.iter().any(|note| note.id == candidate) {
                break candidate;
            }
        };
        notes.push(Note::new(id.clone(), fields.clone()));
        self.publish(&notes);
        info!("event=note_create module=store backend=memory status=ok id={id}");
        Ok(id)
    }

    async fn update(&self, id: &NoteId, fields: &NoteFields) -> StoreResult<()> {
        let mut notes = self.lock();
        let Some(note) = notes.iter_mut().find(|note| &note.id == id) else {
            return Err(StoreError::not_found(id));
        };
        note.fields = fields.clone();
        self.publish(&notes);
        info!("event=note_update module=store backend=memory status=ok id={id}");
        Ok(())
    }

    async fn delete(&self, id: &NoteId) -> StoreResult<()> {
        let mut notes = self.lock();
        let before = notes.len();
        notes.retain(|note| &note.id != id);
        let removed = notes.len() != before;
        if removed {
            self.publish(&notes);
        }
        info!("event=note_delete module=store backend=memory status=ok id={id} removed={removed}");
        Ok(())
    }

    async fn subscribe(&self) -> StoreResult<Subscription> {
        Ok(Subscription::new(self.inner.snapshots.subscribe(), None))
    }
}
