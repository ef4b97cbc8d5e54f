//! HTTPバックエンド
//!
//! ## エンドポイント
//! - `GET /get_all_events` 行動イベント一覧
//! - `GET /get_all_videos` 動画一覧
//! - `POST /upload` multipart `file`
//! - `POST /start_inference` form `video_name`
//! - `DELETE /delete_events_for_video?video_name=`
//! - `DELETE /delete_all_events`, `DELETE /delete_all_videos`
//!
//! アップロード・推論の失敗は200で `{"message": "..."}` が返ることがあるため、
//! ステータスだけでなく本文も確認する。

use super::Backend;
use crate::error::{ConsoleError, Result};
use barn_console_common::Payload;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const INFERENCE_COMPLETED: &str = "Inference completed";
const UPLOAD_SUCCESS: &str = "success";

/// アップロード・推論・削除の応答
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ActionResponse {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    filename: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_payload(&self, path: &str) -> Result<Payload> {
        let url = self.url(path);
        tracing::debug!(%url, "fetching");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ConsoleError::Fetch(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ConsoleError::Fetch(e.to_string()))?;

        if !status.is_success() {
            return Err(ConsoleError::Fetch(describe_failure(status, &body)));
        }
        Ok(Payload::Text(body))
    }

    async fn send_action(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<(StatusCode, String), String> {
        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;
        Ok((status, body))
    }
}

impl Backend for HttpBackend {
    async fn fetch_dashboard_records(&self) -> Result<Payload> {
        self.get_payload("get_all_events").await
    }

    async fn fetch_video_records(&self) -> Result<Payload> {
        self.get_payload("get_all_videos").await
    }

    async fn upload_video(&self, path: &Path) -> Result<String> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().trim().to_string())
            .ok_or_else(|| ConsoleError::FileNotFound(path.display().to_string()))?;

        let bytes = tokio::fs::read(path).await?;
        tracing::info!(file = %file_name, size = bytes.len(), "uploading video");

        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str("video/mp4")?;
        let form = Form::new().part("file", part);

        let (status, body) = self
            .send_action(self.client.post(self.url("upload")).multipart(form))
            .await
            .map_err(ConsoleError::Upload)?;
        interpret_upload(status, &body).map_err(ConsoleError::Upload)?;
        Ok(file_name)
    }

    async fn request_inference(&self, target: &str) -> Result<()> {
        tracing::info!(video = %target, "starting inference");
        let (status, body) = self
            .send_action(
                self.client
                    .post(self.url("start_inference"))
                    .form(&[("video_name", target)]),
            )
            .await
            .map_err(ConsoleError::Inference)?;
        interpret_inference(status, &body).map_err(ConsoleError::Inference)
    }

    async fn delete_events_for_video(&self, video_name: &str) -> Result<()> {
        let (status, body) = self
            .send_action(
                self.client
                    .delete(self.url("delete_events_for_video"))
                    .query(&[("video_name", video_name)]),
            )
            .await
            .map_err(ConsoleError::Purge)?;
        interpret_delete(status, &body).map_err(ConsoleError::Purge)
    }

    async fn delete_all_events(&self) -> Result<()> {
        let (status, body) = self
            .send_action(self.client.delete(self.url("delete_all_events")))
            .await
            .map_err(ConsoleError::Purge)?;
        interpret_delete(status, &body).map_err(ConsoleError::Purge)
    }

    async fn delete_all_videos(&self) -> Result<()> {
        let (status, body) = self
            .send_action(self.client.delete(self.url("delete_all_videos")))
            .await
            .map_err(ConsoleError::Purge)?;
        interpret_delete(status, &body).map_err(ConsoleError::Purge)
    }
}

fn parse_action(body: &str) -> ActionResponse {
    serde_json::from_str(body).unwrap_or_default()
}

/// エラー本文から表示用メッセージを作る
fn describe_failure(status: StatusCode, body: &str) -> String {
    match parse_action(body).message {
        Some(message) => format!("{}: {}", status, message),
        None => status.to_string(),
    }
}

/// `type == "success"` のときだけ成功
fn interpret_upload(status: StatusCode, body: &str) -> std::result::Result<(), String> {
    let response = parse_action(body);
    if status.is_success() && response.kind.as_deref() == Some(UPLOAD_SUCCESS) {
        if let Some(saved) = response.filename {
            tracing::debug!(saved = %saved, "upload accepted");
        }
        return Ok(());
    }
    Err(response
        .message
        .unwrap_or_else(|| format!("unexpected response ({})", status)))
}

/// `message == "Inference completed"` のときだけ成功
fn interpret_inference(status: StatusCode, body: &str) -> std::result::Result<(), String> {
    let response = parse_action(body);
    match response.message {
        Some(message) if status.is_success() && message == INFERENCE_COMPLETED => Ok(()),
        Some(message) => Err(message),
        None => Err(format!("unexpected response ({})", status)),
    }
}

fn interpret_delete(status: StatusCode, body: &str) -> std::result::Result<(), String> {
    if status.is_success() {
        Ok(())
    } else {
        Err(describe_failure(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_success() {
        let body = r#"{"message": "File uploaded successfully", "type": "success", "filename": "static/temp/a.mp4"}"#;
        assert!(interpret_upload(StatusCode::OK, body).is_ok());
    }

    #[test]
    fn test_upload_rejected_with_ok_status() {
        let body = r#"{"message": "Only .mp4 files are supported"}"#;
        assert_eq!(
            interpret_upload(StatusCode::OK, body).unwrap_err(),
            "Only .mp4 files are supported"
        );
    }

    #[test]
    fn test_upload_server_error() {
        let body = r#"{"message": "Error: disk full"}"#;
        assert_eq!(
            interpret_upload(StatusCode::INTERNAL_SERVER_ERROR, body).unwrap_err(),
            "Error: disk full"
        );
    }

    #[test]
    fn test_upload_non_json_body() {
        let err = interpret_upload(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert!(err.contains("502"));
    }

    #[test]
    fn test_inference_completed() {
        let body = r#"{"message": "Inference completed", "video_name": "static/annotated_video/a.mp4"}"#;
        assert!(interpret_inference(StatusCode::OK, body).is_ok());
    }

    #[test]
    fn test_inference_error_message() {
        let body = r#"{"message": "Error: cannot open video"}"#;
        assert_eq!(
            interpret_inference(StatusCode::OK, body).unwrap_err(),
            "Error: cannot open video"
        );
    }

    #[test]
    fn test_inference_missing_video_name() {
        let body = r#"{"message": "Please Provide The video_name to test."}"#;
        assert!(interpret_inference(StatusCode::OK, body).is_err());
    }

    #[test]
    fn test_delete_failure_message() {
        let body = r#"{"message": " video_name is required"}"#;
        let err = interpret_delete(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert!(err.contains("400"));
        assert!(err.contains("video_name is required"));
    }

    #[test]
    fn test_url_join() {
        let backend = HttpBackend::new("http://127.0.0.1:5000/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.base_url(), "http://127.0.0.1:5000");
        assert_eq!(backend.url("get_all_events"), "http://127.0.0.1:5000/get_all_events");
    }
}
