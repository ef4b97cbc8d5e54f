//! アップロード対象の動画収集
//!
//! バックエンドは `.mp4` で終わるファイル名しか受け付けない（大文字小文字を区別）。

use crate::error::{ConsoleError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const VIDEO_SUFFIX: &str = ".mp4";

#[derive(Debug, Clone)]
pub struct VideoFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

/// ファイル名がアップロード可能か
pub fn is_uploadable(file_name: &str) -> bool {
    file_name.trim().ends_with(VIDEO_SUFFIX)
}

/// 単一ファイルの事前チェック
pub fn validate_video(path: &Path) -> Result<VideoFile> {
    if !path.is_file() {
        return Err(ConsoleError::FileNotFound(path.display().to_string()));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if !is_uploadable(&file_name) {
        return Err(ConsoleError::UnsupportedVideo(file_name));
    }

    let size = std::fs::metadata(path)?.len();
    Ok(VideoFile {
        path: path.to_path_buf(),
        file_name,
        size,
    })
}

/// ファイルならそれ1件、フォルダなら直下の `.mp4` をすべて集める
pub fn collect_videos(path: &Path) -> Result<Vec<VideoFile>> {
    if path.is_file() {
        return Ok(vec![validate_video(path)?]);
    }
    if !path.exists() {
        return Err(ConsoleError::FileNotFound(path.display().to_string()));
    }

    let mut videos = Vec::new();

    for entry in WalkDir::new(path)
        .max_depth(1)  // 直下のみ
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let entry_path = entry.path();
        if !entry_path.is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().to_string();
        if !is_uploadable(&file_name) {
            tracing::debug!(file = %file_name, "skipping non-mp4 file");
            continue;
        }

        videos.push(VideoFile {
            path: entry_path.to_path_buf(),
            size: entry.metadata().map(|m| m.len()).unwrap_or(0),
            file_name,
        });
    }

    videos.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    if videos.is_empty() {
        return Err(ConsoleError::NoVideosFound(path.display().to_string()));
    }
    Ok(videos)
}
