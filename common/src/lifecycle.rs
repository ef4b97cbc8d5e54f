//! 推論ライフサイクル管理
//!
//! 動画ごとの推論状態を導出する。
//!
//! ```text
//! Unprocessed --(request)--> Requested --(再取得でProcessedを確認)--> Processed
//!      ^                         |
//!      +----(呼び出し失敗/再取得で未処理)----+
//! ```
//!
//! `Requested` は画面側の楽観的な状態で、正は常に次回の再取得結果。
//! 推論の呼び出し自体は行わない（呼び出し側が外部に委譲する）。

use crate::record::{InferenceStatus, Record, VideoRecord};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// 動画1本の推論状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unprocessed,
    Requested,
    Processed,
}

impl LifecycleState {
    /// 操作ボタンの表記
    pub fn action_label(&self) -> &'static str {
        match self {
            LifecycleState::Unprocessed => "Start Inference",
            LifecycleState::Requested => "Requested",
            LifecycleState::Processed => "Processed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Unprocessed => write!(f, "unprocessed"),
            LifecycleState::Requested => write!(f, "requested"),
            LifecycleState::Processed => write!(f, "processed"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Video already processed: {0}")]
    AlreadyProcessed(String),

    #[error("Inference already requested: {0}")]
    AlreadyRequested(String),

    #[error("Video record has no name or preview path")]
    MissingName,
}

/// 推論リクエスト中のチケット
///
/// 外部呼び出しの結果に応じて `confirm` か `rollback` に渡す。
#[derive(Debug)]
#[must_use = "confirm or roll back the pending request"]
pub struct PendingInference {
    key: String,
    target: String,
}

impl PendingInference {
    pub fn video(&self) -> &str {
        &self.key
    }

    /// 推論APIに渡す動画パス
    pub fn target(&self) -> &str {
        &self.target
    }
}

#[derive(Debug, Clone, Copy)]
struct RequestEntry {
    /// 外部呼び出しが成功を返したか
    confirmed: bool,
}

/// 推論状態トラッカー
#[derive(Debug, Clone, Default)]
pub struct InferenceTracker {
    requests: HashMap<String, RequestEntry>,
    /// セッション中に処理済みを確認した動画
    processed: HashSet<String>,
}

impl InferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, video: &VideoRecord) -> LifecycleState {
        let key = video.key();
        if video.status() == InferenceStatus::Processed
            || key.is_some_and(|k| self.processed.contains(k))
        {
            return LifecycleState::Processed;
        }
        match key {
            Some(k) if self.requests.contains_key(k) => LifecycleState::Requested,
            _ => LifecycleState::Unprocessed,
        }
    }

    /// 推論リクエストを受け付けられるか
    pub fn can_request(&self, video: &VideoRecord) -> bool {
        self.state(video) == LifecycleState::Unprocessed && video.inference_target().is_some()
    }

    /// 楽観的に `Requested` へ遷移
    pub fn begin_request(&mut self, video: &VideoRecord) -> Result<PendingInference, LifecycleError> {
        let key = video.key().ok_or(LifecycleError::MissingName)?.to_string();
        let target = video.inference_target().ok_or(LifecycleError::MissingName)?;

        match self.state(video) {
            LifecycleState::Processed => Err(LifecycleError::AlreadyProcessed(key)),
            LifecycleState::Requested => Err(LifecycleError::AlreadyRequested(key)),
            LifecycleState::Unprocessed => {
                self.requests
                    .insert(key.clone(), RequestEntry { confirmed: false });
                tracing::debug!(video = %key, "inference requested");
                Ok(PendingInference { key, target })
            }
        }
    }

    /// 外部呼び出しが成功した。再取得まで `Requested` のまま
    pub fn confirm(&mut self, pending: PendingInference) {
        if let Some(entry) = self.requests.get_mut(&pending.key) {
            entry.confirmed = true;
        }
    }

    /// 外部呼び出しが失敗した。`Unprocessed` に戻す（再試行はしない）
    pub fn rollback(&mut self, pending: PendingInference) {
        self.requests.remove(&pending.key);
        tracing::debug!(video = %pending.key, "inference request rolled back");
    }

    /// 再取得した動画一覧と突き合わせる
    ///
    /// - `Processed` を確認した動画はセッション中ずっと処理済み
    /// - 呼び出し完了済みのリクエストは取得結果の状態に従う
    /// - 呼び出し中のリクエストは `Requested` のまま
    /// - 一覧から消えた動画のリクエストは破棄
    pub fn reconcile(&mut self, records: &[Record]) {
        let mut listed: HashSet<&str> = HashSet::new();

        for video in records.iter().filter_map(Record::as_video) {
            let Some(key) = video.key() else { continue };
            listed.insert(key);
            if video.status() == InferenceStatus::Processed {
                self.processed.insert(key.to_string());
            }
        }

        let processed = &self.processed;
        self.requests.retain(|key, entry| {
            !entry.confirmed && listed.contains(key.as_str()) && !processed.contains(key)
        });
    }

    /// `Requested` の件数
    pub fn pending_count(&self) -> usize {
        self.requests.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(name: &str, status: Option<InferenceStatus>) -> VideoRecord {
        VideoRecord {
            video_name: Some(name.into()),
            preview_video: Some(format!("input_video/{}", name)),
            inference_status: status,
            ..Default::default()
        }
    }

    #[test]
    fn test_processed_disables_request() {
        let tracker = InferenceTracker::new();
        let v = video("a.mp4", Some(InferenceStatus::Processed));
        assert_eq!(tracker.state(&v), LifecycleState::Processed);
        assert!(!tracker.can_request(&v));
    }

    #[test]
    fn test_missing_status_enables_request() {
        let tracker = InferenceTracker::new();
        let v = video("a.mp4", None);
        assert_eq!(tracker.state(&v), LifecycleState::Unprocessed);
        assert!(tracker.can_request(&v));
    }

    #[test]
    fn test_successful_request_becomes_requested() {
        let mut tracker = InferenceTracker::new();
        let v = video("a.mp4", Some(InferenceStatus::Unprocessed));

        let pending = tracker.begin_request(&v).unwrap();
        assert_eq!(pending.target(), "input_video/a.mp4");
        assert_eq!(tracker.state(&v), LifecycleState::Requested);

        tracker.confirm(pending);
        assert_eq!(tracker.state(&v), LifecycleState::Requested);
        assert!(!tracker.can_request(&v));
    }

    #[test]
    fn test_failed_request_rolls_back() {
        let mut tracker = InferenceTracker::new();
        let v = video("a.mp4", None);

        let pending = tracker.begin_request(&v).unwrap();
        tracker.rollback(pending);
        assert_eq!(tracker.state(&v), LifecycleState::Unprocessed);
        assert_eq!(tracker.pending_count(), 0);
    }

    #[test]
    fn test_double_request_rejected() {
        let mut tracker = InferenceTracker::new();
        let v = video("a.mp4", None);
        let _pending = tracker.begin_request(&v).unwrap();
        assert_eq!(
            tracker.begin_request(&v).unwrap_err(),
            LifecycleError::AlreadyRequested("a.mp4".into())
        );
    }

    #[test]
    fn test_request_on_processed_rejected() {
        let mut tracker = InferenceTracker::new();
        let v = video("a.mp4", Some(InferenceStatus::Processed));
        assert_eq!(
            tracker.begin_request(&v).unwrap_err(),
            LifecycleError::AlreadyProcessed("a.mp4".into())
        );
    }

    #[test]
    fn test_request_without_name_rejected() {
        let mut tracker = InferenceTracker::new();
        assert_eq!(
            tracker.begin_request(&VideoRecord::default()).unwrap_err(),
            LifecycleError::MissingName
        );
    }

    #[test]
    fn test_reconcile_processed_is_terminal() {
        let mut tracker = InferenceTracker::new();
        let pending = tracker.begin_request(&video("a.mp4", None)).unwrap();
        tracker.confirm(pending);

        tracker.reconcile(&[Record::Video(video("a.mp4", Some(InferenceStatus::Processed)))]);
        assert_eq!(tracker.pending_count(), 0);

        // 後の取得で未処理と報告されても処理済みのまま
        let stale = video("a.mp4", Some(InferenceStatus::Unprocessed));
        tracker.reconcile(&[Record::Video(stale.clone())]);
        assert_eq!(tracker.state(&stale), LifecycleState::Processed);
    }

    #[test]
    fn test_reconcile_confirmed_adopts_fetched_status() {
        let mut tracker = InferenceTracker::new();
        let v = video("a.mp4", None);
        let pending = tracker.begin_request(&v).unwrap();
        tracker.confirm(pending);

        tracker.reconcile(&[Record::Video(v.clone())]);
        assert_eq!(tracker.state(&v), LifecycleState::Unprocessed);
    }

    #[test]
    fn test_reconcile_keeps_in_flight_request() {
        let mut tracker = InferenceTracker::new();
        let v = video("a.mp4", None);
        let _pending = tracker.begin_request(&v).unwrap();

        tracker.reconcile(&[Record::Video(v.clone())]);
        assert_eq!(tracker.state(&v), LifecycleState::Requested);
    }

    #[test]
    fn test_reconcile_drops_unlisted_video() {
        let mut tracker = InferenceTracker::new();
        let _pending = tracker.begin_request(&video("a.mp4", None)).unwrap();

        tracker.reconcile(&[Record::Video(video("b.mp4", None))]);
        assert_eq!(tracker.pending_count(), 0);
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(LifecycleState::Unprocessed.action_label(), "Start Inference");
        assert_eq!(LifecycleState::Requested.action_label(), "Requested");
        assert_eq!(LifecycleState::Processed.action_label(), "Processed");
    }
}
