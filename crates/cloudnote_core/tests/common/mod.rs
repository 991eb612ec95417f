#![allow(dead_code)]

use async_trait::async_trait;
use cloudnote_core::{
    ImageUploader, MemoryNoteStore, NoteFields, NoteId, NoteStore, StoreError, StoreErrorKind,
    StoreResult, Subscription, UploadError,
};
use std::sync::{Arc, Mutex};

/// Ordered record of every outbound call made by the doubles.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.calls.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }
}

/// Uploader returning a fixed outcome and logging `upload:<len>`.
pub struct FakeUploader {
    outcome: Result<String, UploadError>,
    log: CallLog,
}

impl FakeUploader {
    pub fn succeeding(url: &str, log: &CallLog) -> Self {
        Self {
            outcome: Ok(url.to_string()),
            log: log.clone(),
        }
    }

    pub fn failing(err: UploadError, log: &CallLog) -> Self {
        Self {
            outcome: Err(err),
            log: log.clone(),
        }
    }
}

#[async_trait]
impl ImageUploader for FakeUploader {
    async fn upload_bytes(&self, bytes: Vec<u8>) -> Result<String, UploadError> {
        self.log.push(format!("upload:{}", bytes.len()));
        self.outcome.clone()
    }
}

/// Memory store wrapper that logs calls and can reject writes.
#[derive(Clone)]
pub struct RecordingStore {
    pub inner: MemoryNoteStore,
    log: CallLog,
    reject_writes: Option<String>,
}

impl RecordingStore {
    pub fn new(inner: MemoryNoteStore, log: &CallLog) -> Self {
        Self {
            inner,
            log: log.clone(),
            reject_writes: None,
        }
    }

    pub fn rejecting_writes(mut self, message: &str) -> Self {
        self.reject_writes = Some(message.to_string());
        self
    }

    fn check_writable(&self) -> StoreResult<()> {
        match &self.reject_writes {
            Some(message) => Err(StoreError::new(StoreErrorKind::Rejected, message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NoteStore for RecordingStore {
    async fn create(&self, fields: &NoteFields) -> StoreResult<NoteId> {
        self.log.push(format!("create:{}", fields.image_path));
        self.check_writable()?;
        self.inner.create(fields).await
    }

    async fn update(&self, id: &NoteId, fields: &NoteFields) -> StoreResult<()> {
        self.log.push(format!("update:{id}:{}", fields.image_path));
        self.check_writable()?;
        self.inner.update(id, fields).await
    }

    async fn delete(&self, id: &NoteId) -> StoreResult<()> {
        self.log.push(format!("delete:{id}"));
        self.inner.delete(id).await
    }

    async fn subscribe(&self) -> StoreResult<Subscription> {
        self.inner.subscribe().await
    }
}
