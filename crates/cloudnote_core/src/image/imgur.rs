//! Imgur anonymous upload client.
//!
//! Wire contract: `POST <endpoint>` with `Authorization: Client-ID <id>`
//! and a multipart text field `image` holding base64 bytes. The durable
//! URL is read from `data.link` in the JSON response.

use crate::config::{ConfigError, ImageHostConfig};
use crate::image::{ImageUploader, UploadError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{info, warn};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::Form;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const IMAGE_FORM_FIELD: &str = "image";

/// Reqwest-backed `ImageUploader` for the Imgur v3 API.
#[derive(Debug, Clone)]
pub struct ImgurUploader {
    client: Client,
    endpoint: String,
    client_id: String,
}

impl ImgurUploader {
    /// Builds an uploader from validated image host settings.
    ///
    /// # Errors
    /// - Returns `ConfigError::Invalid` when settings fail validation.
    /// - Returns `ConfigError::Client` when the HTTP client cannot be built.
    pub fn new(config: &ImageHostConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| ConfigError::Client(format!("image host client: {err}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim().to_string(),
            client_id: config.client_id.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageUploader for ImgurUploader {
    async fn upload_bytes(&self, bytes: Vec<u8>) -> Result<String, UploadError> {
        let byte_len = bytes.len();
        let form = Form::new().text(IMAGE_FORM_FIELD, STANDARD.encode(&bytes));

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Client-ID {}", self.client_id))
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    "event=image_upload module=image status=error kind=network timeout={}",
                    err.is_timeout()
                );
                UploadError::Network(transport_message(&err))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| UploadError::Network(transport_message(&err)))?;

        match parse_upload_response(status, &body) {
            Ok(link) => {
                info!("event=image_upload module=image status=ok bytes={byte_len} http={status}");
                Ok(link)
            }
            Err(err) => {
                warn!("event=image_upload module=image status=error kind=malformed http={status}");
                Err(err)
            }
        }
    }
}

fn transport_message(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("could not connect to image host: {err}")
    } else {
        err.to_string()
    }
}

/// Extracts `data.link` from an upload response body.
pub(crate) fn parse_upload_response(status: u16, body: &str) -> Result<String, UploadError> {
    if body.trim().is_empty() {
        return Err(UploadError::MalformedResponse(format!(
            "no response body from image host (HTTP {status})"
        )));
    }

    let json: Value = serde_json::from_str(body).map_err(|err| {
        UploadError::MalformedResponse(format!("response is not valid JSON (HTTP {status}): {err}"))
    })?;

    let data = json.get("data");
    match data.and_then(|value| value.get("link")).and_then(Value::as_str) {
        Some(link) if !link.trim().is_empty() => Ok(link.to_string()),
        _ => {
            let detail = data
                .and_then(|value| value.get("error"))
                .and_then(describe_host_error)
                .map(|text| format!(": {text}"))
                .unwrap_or_default();
            Err(UploadError::MalformedResponse(format!(
                "response has no `data.link` (HTTP {status}){detail}"
            )))
        }
    }
}

// Imgur reports `data.error` either as a string or as `{ "message": .. }`.
fn describe_host_error(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
