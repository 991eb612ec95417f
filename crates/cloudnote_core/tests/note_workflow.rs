mod common;

use cloudnote_core::{
    ErrorCategory, MemoryNoteStore, Note, NoteDraft, NoteFields, NoteId, NoteWorkflow,
    PendingImage, SaveOperation, SaveState, UploadError, WorkflowError,
};
use common::{CallLog, FakeUploader, RecordingStore};
use std::sync::{Arc, Mutex};

const UPLOADED_URL: &str = "https://i.imgur.com/x.png";

fn seeded_store() -> MemoryNoteStore {
    MemoryNoteStore::with_notes(vec![Note::new(
        NoteId::from("abc123"),
        NoteFields::new("Grocery", "Milk, eggs", "https://i.imgur.com/old.png"),
    )])
}

#[tokio::test]
async fn blank_title_or_content_fails_validation_without_calls() {
    let log = CallLog::default();
    let store = RecordingStore::new(MemoryNoteStore::new(), &log);
    let workflow = NoteWorkflow::new(store, FakeUploader::succeeding(UPLOADED_URL, &log));

    let cases = [("", "body"), ("   ", "body"), ("title", ""), ("title", " \n\t"), ("", "")];
    for (title, content) in cases {
        let draft = NoteDraft::new(title, content).with_image(PendingImage::from_bytes(vec![1]));
        let err = workflow.create_note(draft.clone()).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err = workflow
            .update_note(&NoteId::from("abc123"), "", draft)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    assert!(log.is_empty(), "unexpected calls: {:?}", log.entries());
}

#[tokio::test]
async fn create_without_image_persists_empty_image_path_and_reaches_subscribers() {
    let log = CallLog::default();
    let memory = MemoryNoteStore::new();
    let workflow = NoteWorkflow::new(
        RecordingStore::new(memory.clone(), &log),
        FakeUploader::succeeding(UPLOADED_URL, &log),
    );
    let mut feed = workflow.list_notes().await.unwrap();
    assert!(feed.next().await.unwrap().is_empty());

    let id = workflow
        .create_note(NoteDraft::new("Grocery", "Milk, eggs"))
        .await
        .unwrap();

    assert_eq!(log.entries(), vec!["create:".to_string()]);
    let snapshot = feed.next().await.unwrap();
    let note = snapshot.get(&id).expect("created note should be delivered");
    assert_eq!(note.fields, NoteFields::new("Grocery", "Milk, eggs", ""));
}

#[tokio::test]
async fn create_with_image_uploads_before_persisting() {
    let log = CallLog::default();
    let memory = MemoryNoteStore::new();
    let workflow = NoteWorkflow::new(
        RecordingStore::new(memory.clone(), &log),
        FakeUploader::succeeding(UPLOADED_URL, &log),
    );

    let id = workflow
        .create_note(
            NoteDraft::new("Trip", "Photos").with_image(PendingImage::from_bytes(vec![7; 3])),
        )
        .await
        .unwrap();

    assert_eq!(
        log.entries(),
        vec!["upload:3".to_string(), format!("create:{UPLOADED_URL}")]
    );
    assert_eq!(memory.get(&id).unwrap().image_path(), UPLOADED_URL);
}

#[tokio::test]
async fn update_with_new_image_carries_uploaded_url() {
    let log = CallLog::default();
    let memory = seeded_store();
    let workflow = NoteWorkflow::new(
        RecordingStore::new(memory.clone(), &log),
        FakeUploader::succeeding(UPLOADED_URL, &log),
    );
    let existing = memory.get(&NoteId::from("abc123")).unwrap();

    workflow
        .update_existing(
            &existing,
            NoteDraft::new("Grocery", "Milk, eggs").with_image(PendingImage::from_bytes(vec![1])),
        )
        .await
        .unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "upload:1".to_string(),
            format!("update:abc123:{UPLOADED_URL}")
        ]
    );
    let updated = memory.get(&NoteId::from("abc123")).unwrap();
    assert_eq!(updated.title(), "Grocery");
    assert_eq!(updated.content(), "Milk, eggs");
    assert_eq!(updated.image_path(), UPLOADED_URL);
}

#[tokio::test]
async fn update_without_new_image_keeps_known_image_path() {
    let log = CallLog::default();
    let memory = seeded_store();
    let workflow = NoteWorkflow::new(
        RecordingStore::new(memory.clone(), &log),
        FakeUploader::succeeding(UPLOADED_URL, &log),
    );
    let mut feed = workflow.list_notes().await.unwrap();
    feed.next().await.unwrap();

    workflow
        .update_note(
            &NoteId::from("abc123"),
            "https://i.imgur.com/old.png",
            NoteDraft::new("Groceries", "Milk, eggs, bread"),
        )
        .await
        .unwrap();

    let snapshot = feed.next().await.unwrap();
    let note = snapshot.get(&NoteId::from("abc123")).unwrap();
    assert_eq!(note.title(), "Groceries");
    assert_eq!(note.image_path(), "https://i.imgur.com/old.png");
    assert!(log.entries().iter().all(|entry| !entry.starts_with("upload")));
}

#[tokio::test]
async fn network_failure_during_upload_skips_update() {
    let log = CallLog::default();
    let memory = seeded_store();
    let workflow = NoteWorkflow::new(
        RecordingStore::new(memory.clone(), &log),
        FakeUploader::failing(UploadError::Network("connection reset".to_string()), &log),
    );

    let err = workflow
        .update_note(
            &NoteId::from("abc123"),
            "https://i.imgur.com/old.png",
            NoteDraft::new("Grocery", "Milk").with_image(PendingImage::from_bytes(vec![1, 2])),
        )
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::NetworkFailure);
    assert!(!matches!(err, WorkflowError::Store(_)));
    assert_eq!(log.entries(), vec!["upload:2".to_string()]);
    assert_eq!(
        memory.get(&NoteId::from("abc123")).unwrap().content(),
        "Milk, eggs"
    );
}

#[tokio::test]
async fn unreadable_image_fails_before_upload_request() {
    let log = CallLog::default();
    let memory = MemoryNoteStore::new();
    let workflow = NoteWorkflow::new(
        RecordingStore::new(memory.clone(), &log),
        FakeUploader::succeeding(UPLOADED_URL, &log),
    );
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("deleted.png");

    let err = workflow
        .create_note(NoteDraft::new("a", "b").with_image(PendingImage::from_path(missing)))
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::ReadFailure);
    assert!(log.is_empty());
    assert!(memory.is_empty());
}

#[tokio::test]
async fn store_failure_after_upload_leaves_image_orphaned() {
    let log = CallLog::default();
    let memory = seeded_store();
    let workflow = NoteWorkflow::new(
        RecordingStore::new(memory.clone(), &log).rejecting_writes("permission denied"),
        FakeUploader::succeeding(UPLOADED_URL, &log),
    );

    let err = workflow
        .update_note(
            &NoteId::from("abc123"),
            "https://i.imgur.com/old.png",
            NoteDraft::new("Grocery", "Milk").with_image(PendingImage::from_bytes(vec![9])),
        )
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Store);
    assert!(err.to_string().contains("permission denied"));
    // The upload happened and is not compensated.
    assert_eq!(log.entries()[0], "upload:1");
    assert_eq!(
        memory.get(&NoteId::from("abc123")).unwrap().image_path(),
        "https://i.imgur.com/old.png"
    );
}

#[tokio::test]
async fn update_of_missing_note_is_a_store_error() {
    let log = CallLog::default();
    let workflow = NoteWorkflow::new(
        RecordingStore::new(MemoryNoteStore::new(), &log),
        FakeUploader::succeeding(UPLOADED_URL, &log),
    );

    let err = workflow
        .update_note(&NoteId::from("gone"), "", NoteDraft::new("a", "b"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Store);
}

#[tokio::test]
async fn delete_is_idempotent_and_never_uploads() {
    let log = CallLog::default();
    let memory = seeded_store();
    let workflow = NoteWorkflow::new(
        RecordingStore::new(memory.clone(), &log),
        FakeUploader::succeeding(UPLOADED_URL, &log),
    );
    let mut feed = workflow.list_notes().await.unwrap();
    assert_eq!(feed.next().await.unwrap().len(), 1);

    let id = NoteId::from("abc123");
    workflow.delete_note(&id).await.unwrap();
    assert!(!feed.next().await.unwrap().contains(&id));

    let second = workflow.delete_note(&id).await;
    let never_existed = workflow.delete_note(&NoteId::from("never")).await;
    assert_eq!(second, never_existed);
    assert!(second.is_ok());
    assert!(log.entries().iter().all(|entry| entry.starts_with("delete:")));
}

#[tokio::test]
async fn state_listener_sees_each_save_stage() {
    let log = CallLog::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let workflow = NoteWorkflow::new(
        RecordingStore::new(MemoryNoteStore::new(), &log),
        FakeUploader::succeeding(UPLOADED_URL, &log),
    )
    .with_state_listener(move |operation, state| sink.lock().unwrap().push((operation, state)));

    workflow.create_note(NoteDraft::new("a", "b")).await.unwrap();
    workflow
        .create_note(NoteDraft::new("a", "b").with_image(PendingImage::from_bytes(vec![1])))
        .await
        .unwrap();
    workflow.create_note(NoteDraft::new("", "b")).await.unwrap_err();

    let states: Vec<SaveState> = seen.lock().unwrap().iter().map(|(_, state)| *state).collect();
    assert_eq!(
        states,
        vec![
            SaveState::Validating,
            SaveState::Persisting,
            SaveState::Done,
            SaveState::Validating,
            SaveState::Uploading,
            SaveState::Persisting,
            SaveState::Done,
            SaveState::Validating,
            SaveState::Failed,
        ]
    );
    assert!(seen
        .lock()
        .unwrap()
        .iter()
        .all(|(operation, _)| *operation == SaveOperation::Create));
}
