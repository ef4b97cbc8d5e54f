//! バックエンド連携
//!
//! 一覧取得・アップロード・推論開始・削除の各呼び出しをトレイトで切り出す。
//! 絞り込みはすべて取得後にクライアント側で行うため、取得系は引数を取らない。

mod http;

pub use http::HttpBackend;

use crate::error::Result;
use barn_console_common::Payload;
use std::path::Path;

/// バックエンド呼び出し
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// 行動イベント一覧
    async fn fetch_dashboard_records(&self) -> Result<Payload>;

    /// アップロード動画一覧
    async fn fetch_video_records(&self) -> Result<Payload>;

    /// 動画をアップロードし、受理された動画名を返す
    async fn upload_video(&self, path: &Path) -> Result<String>;

    /// 推論を開始する（`target` は `input_video/x.mp4` 形式）
    async fn request_inference(&self, target: &str) -> Result<()>;

    /// 指定動画のイベントを削除
    async fn delete_events_for_video(&self, video_name: &str) -> Result<()>;

    async fn delete_all_events(&self) -> Result<()>;

    async fn delete_all_videos(&self) -> Result<()>;
}
