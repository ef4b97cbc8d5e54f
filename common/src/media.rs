//! 動画配信パスの規約
//!
//! バックエンドの静的配信ディレクトリ:
//! - `static/input_video/` アップロードされた元動画
//! - `static/annotated_video/` 推論結果の注釈付き動画（`*_fixed.mp4`）

/// アップロード動画の配置ディレクトリ
pub const UPLOAD_DIR: &str = "input_video";

/// 注釈付き動画の配置ディレクトリ
pub const ANNOTATED_DIR: &str = "annotated_video";

const VIDEO_SUFFIX: &str = ".mp4";
const ANNOTATED_SUFFIX: &str = "_fixed.mp4";

/// 動画名 → 推論APIに渡す相対パス
pub fn upload_path(video_name: &str) -> String {
    format!("{}/{}", UPLOAD_DIR, video_name)
}

/// 動画名 → 注釈付き動画のファイル名
///
/// 最初に現れる `.mp4` だけを置き換える。
pub fn annotated_file_name(video_name: &str) -> String {
    video_name.replacen(VIDEO_SUFFIX, ANNOTATED_SUFFIX, 1)
}

/// 再生URLの組み立て
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLocator {
    base_url: String,
}

impl MediaLocator {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 注釈付き動画のURL
    pub fn annotated_url(&self, video_name: &str) -> String {
        format!(
            "{}/static/{}/{}",
            self.base_url,
            ANNOTATED_DIR,
            annotated_file_name(video_name)
        )
    }

    /// 静的ディレクトリ相対パス（`Preview-Video`）のURL
    pub fn preview_url(&self, preview_path: &str) -> String {
        format!(
            "{}/static/{}",
            self.base_url,
            preview_path.trim_start_matches('/')
        )
    }
}
