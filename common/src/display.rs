//! テーブル表示用の行データ
//!
//! 欠損値のプレースホルダ（`-`）はここでだけ使う。検索には使わない。

use crate::lifecycle::{InferenceTracker, LifecycleState};
use crate::media::MediaLocator;
use crate::record::{keys, ActivityRecord, FieldValue, Record, VideoRecord};
use serde::Serialize;

/// 欠損値の表示
pub const PLACEHOLDER: &str = "-";

pub const ACTIVITY_HEADERS: [&str; 9] = [
    "Cow ID",
    "Video Name",
    "Video Date",
    "Video Time",
    "Camera",
    "Activity Type",
    "Duration",
    "Time of Occurrence",
    "Preview",
];

pub const VIDEO_HEADERS: [&str; 5] = [
    "Video Name",
    "Uploaded Date",
    "Uploaded Time",
    "Preview",
    "Action",
];

/// 行動イベントの1行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRow {
    pub cow_id: String,
    pub video_name: String,
    pub date: String,
    pub time: String,
    pub camera: String,
    pub activity_type: String,
    pub duration: String,
    pub time_of_occurrence: String,
    pub preview_url: String,
}

impl ActivityRow {
    pub fn from_record(record: &ActivityRecord, media: &MediaLocator) -> Self {
        Self {
            cow_id: record
                .cow
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            video_name: text(record.video_name.as_deref()),
            date: text(record.effective_date()),
            time: text(record.effective_time()),
            camera: text(record.camera.as_deref()),
            activity_type: match record.activity_type {
                Some(t) => t.as_str().to_string(),
                // 未知の種別はバックエンドの値をそのまま出す
                None => text(
                    record
                        .extra
                        .get(keys::ACTIVITY_TYPE)
                        .and_then(FieldValue::as_text),
                ),
            },
            duration: text(record.duration()),
            time_of_occurrence: text(record.time_of_occurrence()),
            preview_url: record
                .video_name
                .as_deref()
                .map(|name| media.annotated_url(name))
                .unwrap_or_default(),
        }
    }

    pub fn cells(&self) -> [&str; 9] {
        [
            self.cow_id.as_str(),
            self.video_name.as_str(),
            self.date.as_str(),
            self.time.as_str(),
            self.camera.as_str(),
            self.activity_type.as_str(),
            self.duration.as_str(),
            self.time_of_occurrence.as_str(),
            self.preview_url.as_str(),
        ]
    }
}

/// アップロード動画の1行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRow {
    pub video_name: String,
    pub date: String,
    pub time: String,
    pub preview_url: String,
    #[serde(skip)]
    pub state: LifecycleState,
    pub action: String,
}

impl VideoRow {
    pub fn from_record(record: &VideoRecord, tracker: &InferenceTracker, media: &MediaLocator) -> Self {
        let state = tracker.state(record);
        Self {
            video_name: text(record.video_name.as_deref()),
            date: text(record.upload_date.as_deref()),
            time: text(record.upload_time.as_deref()),
            preview_url: record
                .preview_video
                .as_deref()
                .map(|path| media.preview_url(path))
                .unwrap_or_default(),
            state,
            action: state.action_label().to_string(),
        }
    }

    /// 推論ボタンが押せるか
    pub fn action_enabled(&self) -> bool {
        self.state == LifecycleState::Unprocessed
    }

    pub fn cells(&self) -> [&str; 5] {
        [
            self.video_name.as_str(),
            self.date.as_str(),
            self.time.as_str(),
            self.preview_url.as_str(),
            self.action.as_str(),
        ]
    }
}

/// 行動イベント行（入力順）
pub fn activity_rows<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    media: &MediaLocator,
) -> Vec<ActivityRow> {
    records
        .into_iter()
        .filter_map(Record::as_activity)
        .map(|r| ActivityRow::from_record(r, media))
        .collect()
}

/// 動画行（新しいアップロードが先頭）
///
/// データセット自体の順序は変えない。
pub fn video_rows_newest_first<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    tracker: &InferenceTracker,
    media: &MediaLocator,
) -> Vec<VideoRow> {
    let mut rows: Vec<VideoRow> = records
        .into_iter()
        .filter_map(Record::as_video)
        .map(|r| VideoRow::from_record(r, tracker, media))
        .collect();
    rows.reverse();
    rows
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or(PLACEHOLDER).to_string()
}
