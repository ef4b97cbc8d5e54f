//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use barn_console::error::ConsoleError;
use barn_console::scanner;
use barn_console_common::LifecycleError;
use std::path::Path;
use tempfile::tempdir;

/// 存在しないパスからアップロード対象を集めた場合
#[test]
fn test_collect_nonexistent_path() {
    let err = scanner::collect_videos(Path::new("/nonexistent/path/12345")).unwrap_err();
    assert!(matches!(err, ConsoleError::FileNotFound(_)));
}

/// mp4のないフォルダ
#[test]
fn test_collect_folder_without_videos() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("test.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("clip.mov"), "dummy").unwrap();

    let err = scanner::collect_videos(dir.path()).unwrap_err();
    assert!(matches!(err, ConsoleError::NoVideosFound(_)));
}

/// ConsoleErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        ConsoleError::Config("テスト設定エラー".to_string()),
        ConsoleError::Fetch("接続拒否".to_string()),
        ConsoleError::Upload("Only .mp4 files are supported".to_string()),
        ConsoleError::Inference("Error: cannot open video".to_string()),
        ConsoleError::Purge("400".to_string()),
        ConsoleError::UnsupportedVideo("clip.avi".to_string()),
        ConsoleError::VideoNotFound("a.mp4".to_string()),
        ConsoleError::FileNotFound("a.mp4".to_string()),
        ConsoleError::NoVideosFound("フォルダ".to_string()),
        ConsoleError::Export("Excel生成エラー".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "Error display should not be empty");
    }
}

/// 操作失敗の分類
#[test]
fn test_action_failure_classification() {
    assert!(ConsoleError::Upload("x".into()).is_action_failure());
    assert!(ConsoleError::Inference("x".into()).is_action_failure());
    assert!(ConsoleError::Purge("x".into()).is_action_failure());
    assert!(!ConsoleError::Fetch("x".into()).is_action_failure());
    assert!(!ConsoleError::VideoNotFound("x".into()).is_action_failure());
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: ConsoleError = io_err.into();
    assert!(matches!(err, ConsoleError::Io(_)));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
    let err: ConsoleError = json_err.into();
    assert!(matches!(err, ConsoleError::JsonParse(_)));
}

/// 推論状態エラーからの変換
#[test]
fn test_lifecycle_error_conversion() {
    let err: ConsoleError = LifecycleError::AlreadyProcessed("a.mp4".into()).into();
    assert!(matches!(err, ConsoleError::Lifecycle(_)));
    assert!(format!("{}", err).contains("a.mp4"));
}
