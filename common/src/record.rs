//! レコード型定義
//!
//! バックエンドが返す2種類のレコード:
//! - ActivityRecord: 牛の行動イベント（ブラッシング・飲水・頭突き）
//! - VideoRecord: アップロード済み動画と推論ステータス
//!
//! どちらも同じテーブル描画・フィルタ処理を通るため `Record` で束ねる。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// バックエンドのフィールド名
pub mod keys {
    pub const COW_ID: &str = "Cow-ID";
    pub const COW_ID_1: &str = "Cow-ID 1";
    pub const COW_ID_2: &str = "Cow-ID 2";
    pub const VIDEO_NAME: &str = "Video-Name";
    pub const CAPTURED_DATE: &str = "Video-Date";
    pub const CAPTURED_TIME: &str = "Video-Time";
    pub const UPLOADED_DATE: &str = "Uploaded-Date";
    pub const UPLOADED_TIME: &str = "Uploaded-Time";
    pub const CAMERA: &str = "Camera";
    pub const ACTIVITY_TYPE: &str = "Activity-Type";
    pub const DURATION: &str = "Duration";
    pub const TIME_OF_OCCURRENCE: &str = "Time of Occurrence";

    // 動画一覧は先頭が小文字
    pub const VIDEO_DATE: &str = "video-Date";
    pub const VIDEO_TIME: &str = "video-Time";
    pub const PREVIEW_VIDEO: &str = "Preview-Video";
    pub const INFERENCE_STATUS: &str = "Inference-Status";
}

/// レコード種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFamily {
    Activity,
    Video,
}

/// 行動種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Brushing,
    Drinking,
    Headbutt,
}

impl ActivityType {
    pub const ALL: [ActivityType; 3] = [
        ActivityType::Brushing,
        ActivityType::Drinking,
        ActivityType::Headbutt,
    ];

    /// バックエンドの表記
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Brushing => "Brushing",
            ActivityType::Drinking => "Drinking",
            ActivityType::Headbutt => "Headbutt",
        }
    }

    /// バックエンドの値を完全一致で解釈
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brushing" => Ok(ActivityType::Brushing),
            "drinking" => Ok(ActivityType::Drinking),
            "headbutt" => Ok(ActivityType::Headbutt),
            _ => Err(format!(
                "Unknown activity type: {}. Use brushing, drinking, or headbutt",
                s
            )),
        }
    }
}

/// 推論ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InferenceStatus {
    #[default]
    Unprocessed,
    Processed,
}

impl InferenceStatus {
    pub fn from_wire(value: &str) -> Self {
        if value == "Processed" {
            InferenceStatus::Processed
        } else {
            InferenceStatus::Unprocessed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InferenceStatus::Unprocessed => "Not Processed",
            InferenceStatus::Processed => "Processed",
        }
    }
}

impl fmt::Display for InferenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 牛ID（単独 or 頭突きのペア）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CowId {
    Single(String),
    Pair(String, String),
}

impl fmt::Display for CowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CowId::Single(id) => f.write_str(id),
            CowId::Pair(first, second) => write!(f, "{} - {}", first, second),
        }
    }
}

/// 既知フィールド以外の値
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 文字列・数値・真偽値（文字列化済み）
    Text(String),
    /// 配列・オブジェクト（文字列化できない）
    Opaque(Value),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Opaque(_) => None,
        }
    }

    fn to_wire(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Opaque(v) => v.clone(),
        }
    }
}

/// 行動イベントレコード
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityRecord {
    pub cow: Option<CowId>,
    pub video_name: Option<String>,
    /// 撮影日（`Video-Date`）
    pub captured_date: Option<String>,
    pub captured_time: Option<String>,
    pub uploaded_date: Option<String>,
    pub uploaded_time: Option<String>,
    pub camera: Option<String>,
    pub activity_type: Option<ActivityType>,
    pub duration: Option<String>,
    pub time_of_occurrence: Option<String>,
    pub extra: BTreeMap<String, FieldValue>,
}

impl ActivityRecord {
    /// 撮影日 → アップロード日の順で有効な日付
    pub fn effective_date(&self) -> Option<&str> {
        first_non_empty(&self.captured_date, &self.uploaded_date)
    }

    pub fn effective_time(&self) -> Option<&str> {
        first_non_empty(&self.captured_time, &self.uploaded_time)
    }

    pub fn is_headbutt(&self) -> bool {
        self.activity_type == Some(ActivityType::Headbutt)
    }

    /// Headbutt以外でのみ意味を持つ
    pub fn duration(&self) -> Option<&str> {
        if self.is_headbutt() {
            None
        } else {
            self.duration.as_deref()
        }
    }

    /// Headbuttでのみ意味を持つ
    pub fn time_of_occurrence(&self) -> Option<&str> {
        if self.is_headbutt() {
            self.time_of_occurrence.as_deref()
        } else {
            None
        }
    }

    fn search_fields(&self) -> Option<Vec<&str>> {
        let mut fields: Vec<&str> = Vec::new();
        match &self.cow {
            Some(CowId::Single(id)) => fields.push(id),
            Some(CowId::Pair(first, second)) => {
                fields.push(first);
                fields.push(second);
            }
            None => {}
        }
        fields.extend(
            [
                &self.video_name,
                &self.captured_date,
                &self.captured_time,
                &self.uploaded_date,
                &self.uploaded_time,
                &self.camera,
                &self.duration,
                &self.time_of_occurrence,
            ]
            .into_iter()
            .filter_map(|v| v.as_deref()),
        );
        if let Some(t) = self.activity_type {
            fields.push(t.as_str());
        }
        push_extra(&mut fields, &self.extra)?;
        Some(fields)
    }

    fn to_wire(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match &self.cow {
            Some(CowId::Single(id)) => insert(&mut map, keys::COW_ID, Some(id)),
            Some(CowId::Pair(first, second)) => {
                insert(&mut map, keys::COW_ID_1, Some(first));
                insert(&mut map, keys::COW_ID_2, Some(second));
            }
            None => {}
        }
        insert(&mut map, keys::VIDEO_NAME, self.video_name.as_ref());
        insert(&mut map, keys::CAPTURED_DATE, self.captured_date.as_ref());
        insert(&mut map, keys::CAPTURED_TIME, self.captured_time.as_ref());
        insert(&mut map, keys::UPLOADED_DATE, self.uploaded_date.as_ref());
        insert(&mut map, keys::UPLOADED_TIME, self.uploaded_time.as_ref());
        insert(&mut map, keys::CAMERA, self.camera.as_ref());
        if let Some(t) = self.activity_type {
            map.insert(keys::ACTIVITY_TYPE.into(), Value::String(t.as_str().into()));
        }
        insert(&mut map, keys::DURATION, self.duration.as_ref());
        insert(&mut map, keys::TIME_OF_OCCURRENCE, self.time_of_occurrence.as_ref());
        for (k, v) in &self.extra {
            map.insert(k.clone(), v.to_wire());
        }
        map
    }
}

/// アップロード動画レコード
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoRecord {
    pub video_name: Option<String>,
    pub upload_date: Option<String>,
    pub upload_time: Option<String>,
    /// 静的ディレクトリからの相対パス（例: `input_video/x.mp4`）
    pub preview_video: Option<String>,
    pub inference_status: Option<InferenceStatus>,
    pub extra: BTreeMap<String, FieldValue>,
}

impl VideoRecord {
    /// ステータス欄がなければ未処理
    pub fn status(&self) -> InferenceStatus {
        self.inference_status.unwrap_or_default()
    }

    /// トラッカーで使う識別子
    pub fn key(&self) -> Option<&str> {
        self.video_name
            .as_deref()
            .or(self.preview_video.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// 推論リクエストに渡す動画パス
    pub fn inference_target(&self) -> Option<String> {
        match (&self.preview_video, &self.video_name) {
            (Some(preview), _) if !preview.is_empty() => Some(preview.clone()),
            (_, Some(name)) if !name.is_empty() => Some(crate::media::upload_path(name)),
            _ => None,
        }
    }

    fn search_fields(&self) -> Option<Vec<&str>> {
        let mut fields: Vec<&str> = [
            &self.video_name,
            &self.upload_date,
            &self.upload_time,
            &self.preview_video,
        ]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .collect();
        if let Some(status) = self.inference_status {
            fields.push(status.as_str());
        }
        push_extra(&mut fields, &self.extra)?;
        Some(fields)
    }

    fn to_wire(&self) -> Map<String, Value> {
        let mut map = Map::new();
        insert(&mut map, keys::VIDEO_NAME, self.video_name.as_ref());
        insert(&mut map, keys::PREVIEW_VIDEO, self.preview_video.as_ref());
        if let Some(status) = self.inference_status {
            map.insert(keys::INFERENCE_STATUS.into(), Value::String(status.as_str().into()));
        }
        insert(&mut map, keys::VIDEO_DATE, self.upload_date.as_ref());
        insert(&mut map, keys::VIDEO_TIME, self.upload_time.as_ref());
        for (k, v) in &self.extra {
            map.insert(k.clone(), v.to_wire());
        }
        map
    }
}

/// 正規化済みレコード
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Activity(ActivityRecord),
    Video(VideoRecord),
}

impl Record {
    pub fn family(&self) -> RecordFamily {
        match self {
            Record::Activity(_) => RecordFamily::Activity,
            Record::Video(_) => RecordFamily::Video,
        }
    }

    pub fn as_activity(&self) -> Option<&ActivityRecord> {
        match self {
            Record::Activity(a) => Some(a),
            Record::Video(_) => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoRecord> {
        match self {
            Record::Video(v) => Some(v),
            Record::Activity(_) => None,
        }
    }

    /// 日付フィルタ・表示に使う日付
    pub fn effective_date(&self) -> Option<&str> {
        match self {
            Record::Activity(a) => a.effective_date(),
            Record::Video(v) => v.upload_date.as_deref().filter(|s| !s.is_empty()),
        }
    }

    pub fn activity_type(&self) -> Option<ActivityType> {
        self.as_activity().and_then(|a| a.activity_type)
    }

    /// 検索対象となる全フィールドの文字列表現
    ///
    /// 文字列化できないフィールドを含む場合は `None`。
    /// 表示用のプレースホルダ（`-`）は含まない。
    pub fn search_fields(&self) -> Option<Vec<&str>> {
        match self {
            Record::Activity(a) => a.search_fields(),
            Record::Video(v) => v.search_fields(),
        }
    }

    /// バックエンドと同じキー構成のJSONオブジェクトに戻す
    pub fn to_wire(&self) -> Value {
        match self {
            Record::Activity(a) => Value::Object(a.to_wire()),
            Record::Video(v) => Value::Object(v.to_wire()),
        }
    }
}

fn first_non_empty<'a>(primary: &'a Option<String>, fallback: &'a Option<String>) -> Option<&'a str> {
    primary
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| fallback.as_deref().filter(|s| !s.is_empty()))
}

fn push_extra<'a>(fields: &mut Vec<&'a str>, extra: &'a BTreeMap<String, FieldValue>) -> Option<()> {
    for value in extra.values() {
        fields.push(value.as_text()?);
    }
    Some(())
}

fn insert(map: &mut Map<String, Value>, key: &str, value: Option<&String>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_type_from_wire_is_exact() {
        assert_eq!(ActivityType::from_wire("Brushing"), Some(ActivityType::Brushing));
        assert_eq!(ActivityType::from_wire("brushing"), None);
        assert_eq!(ActivityType::from_wire("Grazing"), None);
    }

    #[test]
    fn test_activity_type_from_str_ignores_case() {
        assert_eq!("HEADBUTT".parse::<ActivityType>(), Ok(ActivityType::Headbutt));
        assert!("walking".parse::<ActivityType>().is_err());
    }

    #[test]
    fn test_inference_status_from_wire() {
        assert_eq!(InferenceStatus::from_wire("Processed"), InferenceStatus::Processed);
        assert_eq!(InferenceStatus::from_wire("Not Processed"), InferenceStatus::Unprocessed);
        assert_eq!(InferenceStatus::from_wire(""), InferenceStatus::Unprocessed);
    }

    #[test]
    fn test_cow_id_display() {
        assert_eq!(CowId::Single("1042".into()).to_string(), "1042");
        assert_eq!(CowId::Pair("12".into(), "7".into()).to_string(), "12 - 7");
    }

    #[test]
    fn test_effective_date_falls_back_to_uploaded() {
        let record = ActivityRecord {
            uploaded_date: Some("2024-03-01".into()),
            uploaded_time: Some("08:15".into()),
            ..Default::default()
        };
        assert_eq!(record.effective_date(), Some("2024-03-01"));
        assert_eq!(record.effective_time(), Some("08:15"));
    }

    #[test]
    fn test_effective_date_skips_empty_captured() {
        let record = ActivityRecord {
            captured_date: Some(String::new()),
            uploaded_date: Some("2024-03-02".into()),
            ..Default::default()
        };
        assert_eq!(record.effective_date(), Some("2024-03-02"));
    }

    #[test]
    fn test_measurement_selected_by_activity_type() {
        let headbutt = ActivityRecord {
            activity_type: Some(ActivityType::Headbutt),
            duration: Some("5s".into()),
            time_of_occurrence: Some("00:12".into()),
            ..Default::default()
        };
        assert_eq!(headbutt.duration(), None);
        assert_eq!(headbutt.time_of_occurrence(), Some("00:12"));

        let brushing = ActivityRecord {
            activity_type: Some(ActivityType::Brushing),
            duration: Some("5s".into()),
            time_of_occurrence: Some("00:12".into()),
            ..Default::default()
        };
        assert_eq!(brushing.duration(), Some("5s"));
        assert_eq!(brushing.time_of_occurrence(), None);
    }

    #[test]
    fn test_search_fields_none_with_opaque_extra() {
        let mut record = ActivityRecord {
            camera: Some("cam-1".into()),
            ..Default::default()
        };
        record
            .extra
            .insert("Boxes".into(), FieldValue::Opaque(serde_json::json!([1, 2])));
        assert!(Record::Activity(record).search_fields().is_none());
    }

    #[test]
    fn test_video_inference_target() {
        let with_preview = VideoRecord {
            video_name: Some("Event_01.mp4".into()),
            preview_video: Some("input_video/Event_01.mp4".into()),
            ..Default::default()
        };
        assert_eq!(with_preview.inference_target().as_deref(), Some("input_video/Event_01.mp4"));

        let name_only = VideoRecord {
            video_name: Some("Event_02.mp4".into()),
            ..Default::default()
        };
        assert_eq!(name_only.inference_target().as_deref(), Some("input_video/Event_02.mp4"));

        assert!(VideoRecord::default().inference_target().is_none());
    }

    #[test]
    fn test_to_wire_keeps_backend_keys() {
        let record = Record::Activity(ActivityRecord {
            cow: Some(CowId::Pair("12".into(), "7".into())),
            activity_type: Some(ActivityType::Headbutt),
            time_of_occurrence: Some("00:12".into()),
            ..Default::default()
        });
        let wire = record.to_wire();
        assert_eq!(wire["Cow-ID 1"], "12");
        assert_eq!(wire["Cow-ID 2"], "7");
        assert_eq!(wire["Activity-Type"], "Headbutt");
        assert_eq!(wire["Time of Occurrence"], "00:12");
        assert!(wire.get("Duration").is_none());
    }
}
