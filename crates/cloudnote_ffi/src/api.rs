//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose note create/update/delete and the live list to Dart via FRB.
//! - Translate core errors into display-ready envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Workflow calls run on a dedicated tokio runtime owned by this crate.
//! - A watch id stays valid until `notes_watch_cancel` or the feed ends.

use cloudnote_core::{
    build_workflow, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, CloudNoteConfig, ImageUploader, MemoryNoteStore, Note, NoteDraft, NoteId,
    NoteStore, NoteWorkflow, PendingImage, Subscription, UploadError, WorkflowError,
};
use log::{info, warn};
use once_cell::sync::{Lazy, OnceCell};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::watch;

type FfiWorkflow = NoteWorkflow<Arc<dyn NoteStore>, Arc<dyn ImageUploader>>;

static RUNTIME: OnceCell<Runtime> = OnceCell::new();
static WORKFLOW: Lazy<RwLock<Option<Arc<FfiWorkflow>>>> = Lazy::new(|| RwLock::new(None));
static WATCHES: Lazy<Mutex<HashMap<String, NoteWatch>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static NEXT_WATCH_ID: AtomicU64 = AtomicU64::new(1);

struct NoteWatch {
    subscription: Arc<tokio::sync::Mutex<Subscription>>,
    cancelled: watch::Sender<bool>,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Result envelope for note write operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Note id for create (and echoed for update/delete).
    pub note_id: Option<String>,
    /// Human-readable message suitable for a toast.
    pub message: String,
    /// Error category label (`validation|read_failure|network_failure|
    /// malformed_response|store`) on failure.
    pub error_kind: Option<String>,
}

impl NoteActionResponse {
    fn success(message: impl Into<String>, note_id: String) -> Self {
        Self {
            ok: true,
            note_id: Some(note_id),
            message: message.into(),
            error_kind: None,
        }
    }

    fn failure(message: impl Into<String>, error_kind: Option<&str>) -> Self {
        Self {
            ok: false,
            note_id: None,
            message: message.into(),
            error_kind: error_kind.map(str::to_string),
        }
    }

    fn from_workflow_error(err: &WorkflowError) -> Self {
        Self::failure(err.to_string(), Some(err.category().as_str()))
    }
}

/// One note row for list rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub note_id: String,
    pub title: String,
    pub content: String,
    /// Image URL, empty when no image is attached.
    pub image_path: String,
}

/// Result of opening a live note list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesWatchResponse {
    pub ok: bool,
    pub watch_id: Option<String>,
    pub message: String,
}

/// One full list delivery from `notes_watch_next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesSnapshotResponse {
    pub ok: bool,
    /// `true` once the feed is cancelled or closed; stop polling.
    pub ended: bool,
    pub items: Vec<NoteItem>,
    pub message: String,
}

/// Configures the Firestore/Imgur backed workflow from a JSON document.
///
/// # FFI contract
/// - Sync call; builds HTTP clients, performs no network I/O.
/// - May be called again (e.g. with a refreshed `id_token`); existing
///   watches keep their previous backend.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure(config_json: String) -> String {
    let config = match CloudNoteConfig::from_json_str(&config_json) {
        Ok(config) => config,
        Err(err) => return format!("configure failed: {err}"),
    };
    match build_workflow(&config) {
        Ok(workflow) => {
            let (store, uploader) = workflow.into_parts();
            let store: Arc<dyn NoteStore> = Arc::new(store);
            let uploader: Arc<dyn ImageUploader> = Arc::new(uploader);
            install_workflow(NoteWorkflow::new(store, uploader));
            info!("event=ffi_configure module=ffi status=ok backend=firestore");
            String::new()
        }
        Err(err) => format!("configure failed: {err}"),
    }
}

/// Configures an in-process store for UI previews and offline demos.
///
/// Image uploads are rejected in this mode; notes live until the process
/// exits.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_in_memory() -> String {
    let store: Arc<dyn NoteStore> = Arc::new(MemoryNoteStore::new());
    let uploader: Arc<dyn ImageUploader> = Arc::new(PreviewUploader);
    install_workflow(NoteWorkflow::new(store, uploader));
    info!("event=ffi_configure module=ffi status=ok backend=memory");
    String::new()
}

/// Creates a note; `image_path` is a readable local file or `None`.
///
/// # FFI contract
/// - Blocking call; run off the UI thread (FRB default).
/// - Never panics; returns the created note id on success.
pub fn note_create(title: String, content: String, image_path: Option<String>) -> NoteActionResponse {
    let draft = draft_from(title, content, image_path);
    match run_workflow(|workflow| async move { workflow.create_note(draft).await }) {
        Ok(Ok(id)) => NoteActionResponse::success("Note saved.", id.to_string()),
        Ok(Err(err)) => NoteActionResponse::from_workflow_error(&err),
        Err(message) => NoteActionResponse::failure(message, None),
    }
}

/// Updates a note. `current_image_path` is kept unless `new_image_path`
/// selects a replacement.
///
/// # FFI contract
/// - Blocking call; run off the UI thread (FRB default).
/// - Never panics.
pub fn note_update(
    note_id: String,
    title: String,
    content: String,
    current_image_path: String,
    new_image_path: Option<String>,
) -> NoteActionResponse {
    let id = NoteId::new(note_id);
    let draft = draft_from(title, content, new_image_path);
    let target = id.clone();
    let outcome = run_workflow(|workflow| async move {
        workflow
            .update_note(&target, &current_image_path, draft)
            .await
    });
    match outcome {
        Ok(Ok(())) => NoteActionResponse::success("Note updated.", id.to_string()),
        Ok(Err(err)) => NoteActionResponse::from_workflow_error(&err),
        Err(message) => NoteActionResponse::failure(message, None),
    }
}

/// Deletes a note. Deleting an unknown id succeeds.
pub fn note_delete(note_id: String) -> NoteActionResponse {
    let id = NoteId::new(note_id);
    let target = id.clone();
    match run_workflow(|workflow| async move { workflow.delete_note(&target).await }) {
        Ok(Ok(())) => NoteActionResponse::success("Note deleted.", id.to_string()),
        Ok(Err(err)) => NoteActionResponse::from_workflow_error(&err),
        Err(message) => NoteActionResponse::failure(message, None),
    }
}

/// Opens a live note list; poll it with `notes_watch_next`.
pub fn notes_watch_start() -> NotesWatchResponse {
    let subscription = match run_workflow(|workflow| async move { workflow.list_notes().await }) {
        Ok(Ok(subscription)) => subscription,
        Ok(Err(err)) => {
            return NotesWatchResponse {
                ok: false,
                watch_id: None,
                message: err.to_string(),
            }
        }
        Err(message) => {
            return NotesWatchResponse {
                ok: false,
                watch_id: None,
                message,
            }
        }
    };

    let watch_id = format!("watch-{}", NEXT_WATCH_ID.fetch_add(1, Ordering::Relaxed));
    let (cancelled, _) = watch::channel(false);
    lock_watches().insert(
        watch_id.clone(),
        NoteWatch {
            subscription: Arc::new(tokio::sync::Mutex::new(subscription)),
            cancelled,
        },
    );
    info!("event=notes_watch module=ffi status=ok op=start watch_id={watch_id}");

    NotesWatchResponse {
        ok: true,
        watch_id: Some(watch_id),
        message: "Watching notes.".to_string(),
    }
}

/// Waits for the next full list for `watch_id`.
///
/// # FFI contract
/// - Blocking call; returns when a snapshot arrives, the watch is
///   cancelled, or the feed closes (`ended = true`).
pub fn notes_watch_next(watch_id: String) -> NotesSnapshotResponse {
    let Some((subscription, mut cancelled)) = lock_watches()
        .get(watch_id.as_str())
        .map(|watch| (Arc::clone(&watch.subscription), watch.cancelled.subscribe()))
    else {
        return NotesSnapshotResponse {
            ok: false,
            ended: true,
            items: Vec::new(),
            message: format!("unknown watch id `{watch_id}`"),
        };
    };

    let next = block_on(async move {
        let mut subscription = subscription.lock().await;
        tokio::select! {
            snapshot = subscription.next() => snapshot,
            _ = cancelled.wait_for(|flag| *flag) => None,
        }
    });

    match next {
        Ok(Some(snapshot)) => {
            let items = snapshot.iter().map(to_note_item).collect::<Vec<_>>();
            NotesSnapshotResponse {
                ok: true,
                ended: false,
                message: format!("{} note(s).", items.len()),
                items,
            }
        }
        Ok(None) => {
            lock_watches().remove(watch_id.as_str());
            NotesSnapshotResponse {
                ok: true,
                ended: true,
                items: Vec::new(),
                message: "Watch ended.".to_string(),
            }
        }
        Err(message) => NotesSnapshotResponse {
            ok: false,
            ended: true,
            items: Vec::new(),
            message,
        },
    }
}

/// Cancels a live note list. Returns `false` for unknown ids.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_watch_cancel(watch_id: String) -> bool {
    match lock_watches().remove(watch_id.as_str()) {
        Some(watch) => {
            watch.cancelled.send_replace(true);
            info!("event=notes_watch module=ffi status=ok op=cancel watch_id={watch_id}");
            true
        }
        None => false,
    }
}

struct PreviewUploader;

#[async_trait::async_trait]
impl ImageUploader for PreviewUploader {
    async fn upload_bytes(&self, _bytes: Vec<u8>) -> Result<String, UploadError> {
        Err(UploadError::Network(
            "image uploads are unavailable in preview mode".to_string(),
        ))
    }
}

fn install_workflow(workflow: FfiWorkflow) {
    let mut slot = WORKFLOW.write().unwrap_or_else(PoisonError::into_inner);
    *slot = Some(Arc::new(workflow));
}

fn current_workflow() -> Result<Arc<FfiWorkflow>, String> {
    WORKFLOW
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or_else(|| "notes backend is not configured; call configure first".to_string())
}

fn run_workflow<T, F, Fut>(f: F) -> Result<T, String>
where
    F: FnOnce(Arc<FfiWorkflow>) -> Fut,
    Fut: Future<Output = T>,
{
    let workflow = current_workflow()?;
    block_on(f(workflow))
}

fn block_on<Fut: Future>(future: Fut) -> Result<Fut::Output, String> {
    let runtime = RUNTIME.get_or_try_init(|| {
        Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("cloudnote-ffi")
            .enable_all()
            .build()
    });
    match runtime {
        Ok(runtime) => Ok(runtime.block_on(future)),
        Err(err) => {
            warn!("event=ffi_runtime module=ffi status=error");
            Err(format!("failed to start async runtime: {err}"))
        }
    }
}

fn lock_watches() -> std::sync::MutexGuard<'static, HashMap<String, NoteWatch>> {
    WATCHES.lock().unwrap_or_else(PoisonError::into_inner)
}

fn draft_from(title: String, content: String, image_path: Option<String>) -> NoteDraft {
    let draft = NoteDraft::new(title, content);
    match image_path.map(|path| path.trim().to_string()) {
        Some(path) if !path.is_empty() => draft.with_image(PendingImage::from_path(path)),
        _ => draft,
    }
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        note_id: note.id.to_string(),
        title: note.title().to_string(),
        content: note.content().to_string(),
        image_path: note.image_path().to_string(),
    }
}
