use cloudnote_core::{
    ErrorCategory, ImageHostConfig, ImageUploader, ImgurUploader, PendingImage, UploadError,
};
use mockito::{Matcher, Server};

const CLIENT_ID: &str = "caada26be7c7f95";

fn uploader_for(endpoint: String) -> ImgurUploader {
    let mut config = ImageHostConfig::new(CLIENT_ID);
    config.endpoint = endpoint;
    config.timeout_ms = 5_000;
    ImgurUploader::new(&config).unwrap()
}

#[tokio::test]
async fn upload_posts_base64_form_field_with_client_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/3/image")
        .match_header("authorization", "Client-ID caada26be7c7f95")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="image""#.to_string()),
            Matcher::Regex("cG5nLWJ5dGVz".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"data":{"id":"x","link":"https://i.imgur.com/x.png"},"success":true,"status":200}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let uploader = uploader_for(format!("{}/3/image", server.url()));
    let url = uploader
        .upload(&PendingImage::from_bytes(b"png-bytes".to_vec()))
        .await
        .unwrap();

    assert_eq!(url, "https://i.imgur.com/x.png");
    mock.assert_async().await;
}

#[tokio::test]
async fn upload_reads_file_handles() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/3/image")
        .match_body(Matcher::Regex("cG5nLWJ5dGVz".to_string()))
        .with_status(200)
        .with_body(r#"{"data":{"link":"https://i.imgur.com/file.png"}}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.png");
    std::fs::write(&path, b"png-bytes").unwrap();

    let uploader = uploader_for(format!("{}/3/image", server.url()));
    let url = uploader.upload(&PendingImage::from_path(&path)).await.unwrap();

    assert_eq!(url, "https://i.imgur.com/file.png");
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_link_is_malformed_response() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/3/image")
        .with_status(403)
        .with_body(r#"{"data":{"error":"Invalid client_id","request":"/3/image"},"success":false,"status":403}"#)
        .create_async()
        .await;

    let uploader = uploader_for(format!("{}/3/image", server.url()));
    let err = uploader
        .upload_bytes(b"img".to_vec())
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::MalformedResponse);
    assert!(err.to_string().contains("Invalid client_id"));
}

#[tokio::test]
async fn empty_body_is_malformed_response() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/3/image")
        .with_status(200)
        .create_async()
        .await;

    let uploader = uploader_for(format!("{}/3/image", server.url()));
    let err = uploader.upload_bytes(b"img".to_vec()).await.unwrap_err();
    assert!(matches!(err, UploadError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_host_is_network_failure() {
    let uploader = uploader_for("http://127.0.0.1:1/3/image".to_string());
    let err = uploader.upload_bytes(b"img".to_vec()).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::NetworkFailure);
    assert!(!err.message().is_empty());
}

#[tokio::test]
async fn unreadable_file_fails_without_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let uploader = uploader_for(format!("{}/3/image", server.url()));
    let err = uploader
        .upload(&PendingImage::from_path(dir.path().join("revoked.png")))
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::ReadFailure);
    mock.assert_async().await;
}

#[test]
fn blank_client_id_is_rejected_at_construction() {
    let config = ImageHostConfig::new(" ");
    assert!(ImgurUploader::new(&config).is_err());
}
