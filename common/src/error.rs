//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// テキストペイロードのデコード失敗
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// デコードは成功したがレコード配列ではない
    #[error("Unexpected payload shape: {0}")]
    UnexpectedShape(String),

    /// バックエンドが `{"message": ...}` 形式のエラーを返した
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
