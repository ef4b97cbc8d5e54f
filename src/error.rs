use barn_console_common::LifecycleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("設定エラー: {0}")]
    Config(String),

    /// 一覧取得の失敗（表示中のデータはそのまま残る）
    #[error("データ取得エラー: {0}")]
    Fetch(String),

    #[error("アップロードエラー: {0}")]
    Upload(String),

    #[error("推論リクエストエラー: {0}")]
    Inference(String),

    #[error("削除エラー: {0}")]
    Purge(String),

    #[error("mp4ファイルのみアップロードできます: {0}")]
    UnsupportedVideo(String),

    #[error("動画が見つかりません: {0}")]
    VideoNotFound(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("アップロードする動画がありません: {0}")]
    NoVideosFound(String),

    #[error("推論状態エラー: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("エクスポートエラー: {0}")]
    Export(String),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl ConsoleError {
    /// 操作の失敗（ユーザーに通知し、楽観的な変更は戻す）
    pub fn is_action_failure(&self) -> bool {
        matches!(
            self,
            ConsoleError::Upload(_) | ConsoleError::Inference(_) | ConsoleError::Purge(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
