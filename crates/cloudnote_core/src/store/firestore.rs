//! Firestore REST (v1) note store.
//!
//! # Responsibility
//! - Map note CRUD onto the documents API of one collection.
//! - Emulate the realtime listener with a polling snapshot feed.
//!
//! # Invariants
//! - Document ids are assigned by Firestore (`POST` without `documentId`).
//! - Updates carry `currentDocument.exists=true`, so a missing id fails
//!   instead of creating a document.
//! - Every successful local write wakes active pollers immediately.

use crate::config::{ConfigError, DocumentStoreConfig};
use crate::model::note::{Note, NoteFields, NoteId, NoteSnapshot};
use crate::store::{NoteStore, StoreError, StoreErrorKind, StoreResult, Subscription};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const FIELD_TITLE: &str = "title";
const FIELD_CONTENT: &str = "content";
const FIELD_IMAGE_PATH: &str = "imagePath";

/// Note store backed by a Firestore collection.
#[derive(Clone)]
pub struct FirestoreNoteStore {
    inner: Arc<FirestoreInner>,
}

struct FirestoreInner {
    client: Client,
    collection_url: String,
    api_key: Option<String>,
    id_token: Option<String>,
    page_size: u32,
    poll_interval: Duration,
    /// Bumped after each successful write to wake pollers.
    writes: watch::Sender<u64>,
}

impl FirestoreNoteStore {
    /// Builds a store client from validated settings.
    ///
    /// # Errors
    /// - Returns `ConfigError::Invalid` when settings fail validation.
    /// - Returns `ConfigError::Client` when the HTTP client cannot be built.
    pub fn new(config: &DocumentStoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| ConfigError::Client(format!("document store client: {err}")))?;
        let collection_url = format!(
            "{}/projects/{}/databases/{}/documents/{}",
            config.base_url.trim().trim_end_matches('/'),
            config.project_id.trim(),
            config.database.trim(),
            config.collection.trim(),
        );
        let (writes, _) = watch::channel(0);

        Ok(Self {
            inner: Arc::new(FirestoreInner {
                client,
                collection_url,
                api_key: non_blank(config.api_key.as_deref()),
                id_token: non_blank(config.id_token.as_deref()),
                page_size: config.page_size,
                poll_interval: Duration::from_millis(config.poll_interval_ms),
                writes,
            }),
        })
    }

    pub fn collection_url(&self) -> &str {
        &self.inner.collection_url
    }

    /// Reads the whole collection once, following page tokens.
    pub async fn list_all(&self) -> StoreResult<NoteSnapshot> {
        self.inner.list_all().await
    }
}

#[async_trait]
impl NoteStore for FirestoreNoteStore {
    async fn create(&self, fields: &NoteFields) -> StoreResult<NoteId> {
        let inner = &self.inner;
        let request = inner
            .authorize(inner.client.post(&inner.collection_url))
            .json(&encode_document(fields));
        let response = send(request, "create").await?;
        let body = success_json(response, "create", None).await?;
        let name = body
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid_response("created document has no `name`"))?;
        let id = document_id_from_name(name)?;

        inner.notify_write();
        info!("event=note_create module=store backend=firestore status=ok id={id}");
        Ok(id)
    }

    async fn update(&self, id: &NoteId, fields: &NoteFields) -> StoreResult<()> {
        let inner = &self.inner;
        let url = inner.document_url(id)?;
        let request = inner
            .authorize(inner.client.patch(url))
            .query(&[
                ("updateMask.fieldPaths", FIELD_TITLE),
                ("updateMask.fieldPaths", FIELD_CONTENT),
                ("updateMask.fieldPaths", FIELD_IMAGE_PATH),
                ("currentDocument.exists", "true"),
            ])
            .json(&encode_document(fields));
        let response = send(request, "update").await?;
        success_json(response, "update", Some(id)).await?;

        inner.notify_write();
        info!("event=note_update module=store backend=firestore status=ok id={id}");
        Ok(())
    }

    async fn delete(&self, id: &NoteId) -> StoreResult<()> {
        let inner = &self.inner;
        let url = inner.document_url(id)?;
        let response = send(inner.authorize(inner.client.delete(url)), "delete").await?;
        // Firestore answers 200 for missing documents; a 404 from a proxy is
        // treated the same way.
        if response.status() != StatusCode::NOT_FOUND {
            success_json(response, "delete", Some(id)).await?;
        }

        inner.notify_write();
        info!("event=note_delete module=store backend=firestore status=ok id={id}");
        Ok(())
    }

    async fn subscribe(&self) -> StoreResult<Subscription> {
        let (tx, rx) = watch::channel(None);
        let writes = self.inner.writes.subscribe();
        let feeder = tokio::spawn(run_poller(Arc::clone(&self.inner), tx, writes));
        debug!("event=notes_subscribe module=store backend=firestore status=ok");
        Ok(Subscription::new(rx, Some(feeder)))
    }
}

impl FirestoreInner {
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match self.api_key.as_deref() {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        };
        match self.id_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // Ids are opaque; the url encoder escapes `?`, `#` and `%` so an id can
    // only ever address its own document.
    fn document_url(&self, id: &NoteId) -> StoreResult<Url> {
        let raw = id.as_str();
        if raw.trim().is_empty() || raw.contains('/') {
            return Err(StoreError::new(
                StoreErrorKind::Rejected,
                format!("`{raw}` is not a valid note id"),
            ));
        }
        let mut url = Url::parse(&self.collection_url).map_err(|err| {
            StoreError::new(
                StoreErrorKind::Rejected,
                format!("invalid collection url `{}`: {err}", self.collection_url),
            )
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                StoreError::new(
                    StoreErrorKind::Rejected,
                    format!("collection url `{}` cannot take a document id", self.collection_url),
                )
            })?
            .push(raw);
        Ok(url)
    }

    fn notify_write(&self) {
        self.writes.send_modify(|count| *count = count.wrapping_add(1));
    }

    async fn list_all(&self) -> StoreResult<NoteSnapshot> {
        let mut notes = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .authorize(self.client.get(&self.collection_url))
                .query(&[("pageSize", self.page_size.to_string())]);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }

            let response = send(request, "list").await?;
            let body = success_json(response, "list", None).await?;
            if let Some(documents) = body.get("documents").and_then(Value::as_array) {
                for document in documents {
                    notes.push(decode_document(document)?);
                }
            }

            page_token = body
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|token| !token.is_empty())
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }

        Ok(NoteSnapshot::new(notes))
    }
}

async fn run_poller(
    inner: Arc<FirestoreInner>,
    tx: watch::Sender<Option<NoteSnapshot>>,
    mut writes: watch::Receiver<u64>,
) {
    let mut last_published: Option<NoteSnapshot> = None;

    loop {
        match inner.list_all().await {
            Ok(snapshot) => {
                if last_published.as_ref() != Some(&snapshot) {
                    if tx.send(Some(snapshot.clone())).is_err() {
                        return;
                    }
                    debug!(
                        "event=notes_snapshot module=store backend=firestore status=ok count={}",
                        snapshot.len()
                    );
                    last_published = Some(snapshot);
                }
            }
            Err(err) => {
                warn!(
                    "event=notes_snapshot module=store backend=firestore status=error kind={:?}",
                    err.kind()
                );
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(inner.poll_interval) => {}
            changed = writes.changed() => {
                if changed.is_err() {
                    return;
                }
            }
            _ = tx.closed() => return,
        }
    }
}

async fn send(request: RequestBuilder, operation: &str) -> StoreResult<Response> {
    request.send().await.map_err(|err| {
        warn!(
            "event=store_request module=store backend=firestore status=error op={operation} kind=transport timeout={}",
            err.is_timeout()
        );
        StoreError::new(
            StoreErrorKind::Transport,
            format!("could not reach document store: {err}"),
        )
    })
}

async fn success_json(
    response: Response,
    operation: &str,
    id: Option<&NoteId>,
) -> StoreResult<Value> {
    let status = response.status();
    let body = response.text().await.map_err(|err| {
        StoreError::new(
            StoreErrorKind::Transport,
            format!("could not read document store response: {err}"),
        )
    })?;

    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        return serde_json::from_str(&body)
            .map_err(|err| invalid_response(&format!("response is not valid JSON: {err}")));
    }

    warn!(
        "event=store_request module=store backend=firestore status=error op={operation} http={}",
        status.as_u16()
    );
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(StoreError::not_found(id));
        }
    }
    Err(StoreError::new(
        StoreErrorKind::Rejected,
        format!(
            "document store rejected {operation} (HTTP {}): {}",
            status.as_u16(),
            error_message(&body)
        ),
    ))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "no error details".to_string())
}

fn invalid_response(message: &str) -> StoreError {
    StoreError::new(
        StoreErrorKind::InvalidResponse,
        format!("unexpected document store response: {message}"),
    )
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Encodes note fields as a Firestore `Document` body.
pub(crate) fn encode_document(fields: &NoteFields) -> Value {
    json!({
        "fields": {
            FIELD_TITLE: { "stringValue": fields.title },
            FIELD_CONTENT: { "stringValue": fields.content },
            FIELD_IMAGE_PATH: { "stringValue": fields.image_path },
        }
    })
}

/// Decodes one Firestore `Document`; missing or non-string fields read as
/// empty strings.
pub(crate) fn decode_document(document: &Value) -> StoreResult<Note> {
    let name = document
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_response("document has no `name`"))?;
    let id = document_id_from_name(name)?;
    let fields = document.get("fields");
    let read = |key: &str| -> String {
        fields
            .and_then(|map| map.get(key))
            .and_then(|value| value.get("stringValue"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(Note::new(
        id,
        NoteFields {
            title: read(FIELD_TITLE),
            content: read(FIELD_CONTENT),
            image_path: read(FIELD_IMAGE_PATH),
        },
    ))
}

fn document_id_from_name(name: &str) -> StoreResult<NoteId> {
    match name.rsplit('/').next() {
        Some(id) if !id.is_empty() => Ok(NoteId::new(id)),
        _ => Err(invalid_response(&format!("bad document name `{name}`"))),
    }
}
