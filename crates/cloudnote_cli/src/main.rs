//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `cloudnote_core` linkage without the Flutter runtime.
//! - Run one create/list/delete cycle against the in-memory store.

use cloudnote_core::{
    ImageUploader, MemoryNoteStore, NoteDraft, NoteWorkflow, UploadError, WorkflowError,
};
use std::process::ExitCode;

/// Stand-in uploader; the smoke cycle never attaches images.
struct NoUploads;

#[async_trait::async_trait]
impl ImageUploader for NoUploads {
    async fn upload_bytes(&self, _bytes: Vec<u8>) -> Result<String, UploadError> {
        Err(UploadError::Network("uploads disabled in smoke check".to_string()))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    println!("cloudnote_core ping={}", cloudnote_core::ping());
    println!("cloudnote_core version={}", cloudnote_core::core_version());

    match smoke_cycle().await {
        Ok(count) => {
            println!("cloudnote_core smoke=ok notes_seen={count}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("cloudnote_core smoke=failed category={} error={err}", err.category());
            ExitCode::FAILURE
        }
    }
}

async fn smoke_cycle() -> Result<usize, WorkflowError> {
    let workflow = NoteWorkflow::new(MemoryNoteStore::new(), NoUploads);
    let mut feed = workflow.list_notes().await?;
    feed.next().await;

    let id = workflow
        .create_note(NoteDraft::new("smoke", "cloudnote smoke check"))
        .await?;
    let seen = feed.next().await.map(|snapshot| snapshot.len()).unwrap_or(0);

    workflow.delete_note(&id).await?;
    feed.cancel();
    Ok(seen)
}
