//! コンソールのセッション状態
//!
//! 2つのデータセット（行動イベント・アップロード動画）、フィルタ条件、
//! 推論状態トラッカーを1か所で持つ。表示用の行は毎回データセットと条件から作り直す。
//!
//! 操作（アップロード・推論・削除）の後は対象データセットを再取得する。
//! 再取得の失敗は操作自体の失敗にはしない（表示中のデータを残してログのみ）。

use crate::client::Backend;
use crate::error::{ConsoleError, Result};
use crate::scanner;
use barn_console_common::{
    activity_rows, filter, normalize_or_empty, video_rows_newest_first, ActivityRow, ActivityType,
    Criteria, DatasetSlot, FetchOutcome, FetchTicket, InferenceTracker, LifecycleState,
    MediaLocator, Payload, Record, RecordFamily, VideoRecord, VideoRow,
};
use chrono::NaiveDate;
use std::path::Path;

pub struct Session<B> {
    backend: B,
    events: DatasetSlot,
    videos: DatasetSlot,
    criteria: Criteria,
    tracker: InferenceTracker,
    media: MediaLocator,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: B, media: MediaLocator) -> Self {
        Self {
            backend,
            events: DatasetSlot::new(RecordFamily::Activity),
            videos: DatasetSlot::new(RecordFamily::Video),
            criteria: Criteria::new(),
            tracker: InferenceTracker::new(),
            media,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn media(&self) -> &MediaLocator {
        &self.media
    }

    // ---- 取得 ----

    /// 行動イベントを再取得
    ///
    /// 取得に失敗した場合は表示中のデータを残したまま `Fetch` エラーを返す。
    /// 本文が壊れていた場合は空データとして反映する。
    pub async fn refresh_events(&mut self) -> Result<FetchOutcome> {
        let ticket = self.events.begin_fetch();
        let payload = self.backend.fetch_dashboard_records().await.map_err(|e| {
            tracing::warn!(error = %e, "event fetch failed; keeping previous dataset");
            into_fetch_error(e)
        })?;
        Ok(self.apply_events(ticket, payload))
    }

    /// 動画一覧を再取得し、推論状態を突き合わせる
    pub async fn refresh_videos(&mut self) -> Result<FetchOutcome> {
        let ticket = self.videos.begin_fetch();
        let payload = self.backend.fetch_video_records().await.map_err(|e| {
            tracing::warn!(error = %e, "video fetch failed; keeping previous dataset");
            into_fetch_error(e)
        })?;
        Ok(self.apply_videos(ticket, payload))
    }

    /// 両方を再取得（片方が失敗してももう片方は取得する）
    pub async fn refresh_all(&mut self) -> Result<()> {
        let events = self.refresh_events().await;
        let videos = self.refresh_videos().await;
        events?;
        videos?;
        Ok(())
    }

    /// 取得済みの本文を行動イベントとして読み込む（ファイル読み込み用）
    pub fn load_events(&mut self, payload: impl Into<Payload>) -> FetchOutcome {
        let ticket = self.events.begin_fetch();
        self.apply_events(ticket, payload.into())
    }

    /// 取得済みの本文を動画一覧として読み込む
    pub fn load_videos(&mut self, payload: impl Into<Payload>) -> FetchOutcome {
        let ticket = self.videos.begin_fetch();
        self.apply_videos(ticket, payload.into())
    }

    fn apply_events(&mut self, ticket: FetchTicket, payload: Payload) -> FetchOutcome {
        let records = normalize_or_empty(payload, RecordFamily::Activity);
        let outcome = self.events.complete(ticket, records);
        tracing::debug!(?outcome, "events dataset updated");
        outcome
    }

    fn apply_videos(&mut self, ticket: FetchTicket, payload: Payload) -> FetchOutcome {
        let records = normalize_or_empty(payload, RecordFamily::Video);
        let outcome = self.videos.complete(ticket, records);
        if matches!(outcome, FetchOutcome::Applied { .. }) {
            self.tracker.reconcile(self.videos.records());
        }
        tracing::debug!(?outcome, pending = self.tracker.pending_count(), "videos dataset updated");
        outcome
    }

    /// 操作後の再取得。失敗してもログのみ
    async fn refresh_after_action(&mut self, family: RecordFamily) {
        let result = match family {
            RecordFamily::Activity => self.refresh_events().await,
            RecordFamily::Video => self.refresh_videos().await,
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, ?family, "re-fetch after action failed");
        }
    }

    // ---- フィルタ ----

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.criteria.set_search(search);
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.criteria.set_date(date);
    }

    pub fn set_activity_type(&mut self, activity_type: Option<ActivityType>) {
        self.criteria.set_activity_type(activity_type);
    }

    pub fn set_criteria(&mut self, criteria: Criteria) {
        self.criteria = criteria;
    }

    /// 条件をすべて解除。何も設定されていなければ何もしない
    pub fn clear_filters(&mut self) -> bool {
        self.criteria.clear()
    }

    // ---- 表示 ----

    pub fn events(&self) -> &[Record] {
        self.events.records()
    }

    pub fn videos(&self) -> &[Record] {
        self.videos.records()
    }

    pub fn tracker(&self) -> &InferenceTracker {
        &self.tracker
    }

    /// 条件に合う行動イベント（入力順）
    pub fn visible_events(&self) -> Vec<&Record> {
        filter::apply(self.events.records(), &self.criteria)
    }

    pub fn event_rows(&self) -> Vec<ActivityRow> {
        activity_rows(self.visible_events(), &self.media)
    }

    /// 動画行（新しい順）
    pub fn video_rows(&self) -> Vec<VideoRow> {
        video_rows_newest_first(self.videos.records(), &self.tracker, &self.media)
    }

    /// 動画名（またはプレビューパス）で動画を探す
    pub fn find_video(&self, name: &str) -> Option<&VideoRecord> {
        let name = name.trim();
        self.videos
            .records()
            .iter()
            .filter_map(Record::as_video)
            .find(|v| {
                v.video_name.as_deref() == Some(name) || v.preview_video.as_deref() == Some(name)
            })
    }

    pub fn video_state(&self, name: &str) -> Option<LifecycleState> {
        self.find_video(name).map(|v| self.tracker.state(v))
    }

    // ---- 操作 ----

    /// 動画をアップロードし、成功したら両方のデータセットを再取得
    pub async fn upload(&mut self, path: &Path) -> Result<String> {
        let video = scanner::validate_video(path)?;
        let name = self.backend.upload_video(&video.path).await?;
        tracing::info!(video = %name, "upload accepted");
        self.refresh_after_action(RecordFamily::Activity).await;
        self.refresh_after_action(RecordFamily::Video).await;
        Ok(name)
    }

    /// 推論を開始する
    ///
    /// 呼び出し前に `Requested` にし、失敗したら `Unprocessed` に戻す（再試行はしない）。
    /// 成功しても再取得で確認するまでは `Requested` のまま。
    pub async fn request_inference(&mut self, video_name: &str) -> Result<LifecycleState> {
        let video = self
            .find_video(video_name)
            .cloned()
            .ok_or_else(|| ConsoleError::VideoNotFound(video_name.to_string()))?;

        let pending = self.tracker.begin_request(&video)?;

        match self.backend.request_inference(pending.target()).await {
            Ok(()) => {
                tracing::info!(video = %pending.video(), "inference call succeeded");
                self.tracker.confirm(pending);
                Ok(LifecycleState::Requested)
            }
            Err(e) => {
                tracing::warn!(video = %pending.video(), error = %e, "inference call failed");
                self.tracker.rollback(pending);
                Err(match e {
                    ConsoleError::Inference(_) => e,
                    other => ConsoleError::Inference(other.to_string()),
                })
            }
        }
    }

    /// 推論を開始し、動画一覧・行動イベントを再取得して確定した状態を返す
    pub async fn run_inference(&mut self, video_name: &str) -> Result<LifecycleState> {
        self.request_inference(video_name).await?;
        self.refresh_after_action(RecordFamily::Video).await;
        self.refresh_after_action(RecordFamily::Activity).await;
        Ok(self
            .video_state(video_name)
            .unwrap_or(LifecycleState::Unprocessed))
    }

    /// 指定動画のイベントを削除
    pub async fn purge_video_events(&mut self, video_name: &str) -> Result<()> {
        self.backend.delete_events_for_video(video_name).await?;
        self.refresh_after_action(RecordFamily::Activity).await;
        Ok(())
    }

    pub async fn purge_all_events(&mut self) -> Result<()> {
        self.backend.delete_all_events().await?;
        self.refresh_after_action(RecordFamily::Activity).await;
        Ok(())
    }

    pub async fn purge_all_videos(&mut self) -> Result<()> {
        self.backend.delete_all_videos().await?;
        self.refresh_after_action(RecordFamily::Video).await;
        Ok(())
    }
}

fn into_fetch_error(e: ConsoleError) -> ConsoleError {
    match e {
        ConsoleError::Fetch(_) => e,
        other => ConsoleError::Fetch(other.to_string()),
    }
}
