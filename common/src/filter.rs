//! フィルタエンジン
//!
//! 正規化済みデータと現在の条件（検索文字列・日付・行動種別）から
//! 表示対象のレコードを導出する。
//!
//! - 条件同士はAND、検索文字列はフィールド間でOR
//! - 入力の順序を保つ（安定フィルタ）
//! - 元データは変更しない。結果は参照のビュー
//! - キャッシュはしない。条件やデータが変わるたびに呼び直す

use crate::record::{ActivityType, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 日付の正規表記
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// 日付として受け付ける書式（時刻付きは日単位に丸める）
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// フィルタ条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Criteria {
    pub search: String,
    pub date: Option<NaiveDate>,
    pub activity_type: Option<ActivityType>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_activity_type(mut self, activity_type: ActivityType) -> Self {
        self.activity_type = Some(activity_type);
        self
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.date = date;
    }

    pub fn set_activity_type(&mut self, activity_type: Option<ActivityType>) {
        self.activity_type = activity_type;
    }

    /// 空白だけの検索文字列は未設定と同じ
    fn has_search(&self) -> bool {
        !self.search.trim().is_empty()
    }

    /// いずれかの条件が設定されているか
    pub fn is_active(&self) -> bool {
        self.has_search() || self.date.is_some() || self.activity_type.is_some()
    }

    /// 「すべてクリア」を提示してよいか
    pub fn can_clear(&self) -> bool {
        self.is_active()
    }

    /// 3条件をまとめて空に戻す
    ///
    /// 何も設定されていなければ何もせず `false` を返す。
    pub fn clear(&mut self) -> bool {
        if !self.can_clear() {
            return false;
        }
        *self = Self::default();
        true
    }

    /// 1レコードが全条件を満たすか
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_search(record) && self.matches_date(record) && self.matches_activity(record)
    }

    fn matches_search(&self, record: &Record) -> bool {
        if !self.has_search() {
            return true;
        }
        let needle = self.search.to_lowercase();
        match record.search_fields() {
            Some(fields) => fields
                .iter()
                .any(|field| field.to_lowercase().contains(&needle)),
            // 文字列化できないフィールドを含むレコードは検索に一致しない
            None => false,
        }
    }

    fn matches_date(&self, record: &Record) -> bool {
        let Some(target) = self.date else {
            return true;
        };
        record
            .effective_date()
            .and_then(canonical_day)
            .is_some_and(|day| day == target)
    }

    fn matches_activity(&self, record: &Record) -> bool {
        match self.activity_type {
            None => true,
            Some(wanted) => record.activity_type() == Some(wanted),
        }
    }
}

/// 条件を満たすレコードを入力順のまま返す
pub fn apply<'a>(records: &'a [Record], criteria: &Criteria) -> Vec<&'a Record> {
    records.iter().filter(|r| criteria.matches(r)).collect()
}

/// 日付文字列を暦日に正規化
///
/// 時刻を含む表記は日付部分のみを使う。解釈できなければ `None`。
pub fn canonical_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(day) = NaiveDate::parse_from_str(value, fmt) {
            return Some(day);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// 暦日を `YYYY-MM-DD` に整形
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// `YYYY-MM-DD` などの入力から条件用の日付を作る
pub fn parse_criteria_date(value: &str) -> Result<NaiveDate, String> {
    canonical_day(value).ok_or_else(|| format!("Invalid date: {}. Use YYYY-MM-DD", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ActivityRecord, CowId, FieldValue, InferenceStatus, VideoRecord};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DAY_FORMAT).unwrap()
    }

    fn activity(id: &str, activity_type: ActivityType, date: &str) -> Record {
        Record::Activity(ActivityRecord {
            cow: Some(CowId::Single(id.into())),
            video_name: Some(format!("Event_{}.mp4", id)),
            captured_date: Some(date.into()),
            activity_type: Some(activity_type),
            ..Default::default()
        })
    }

    fn video(name: &str, date: &str) -> Record {
        Record::Video(VideoRecord {
            video_name: Some(name.into()),
            upload_date: Some(date.into()),
            inference_status: Some(InferenceStatus::Unprocessed),
            ..Default::default()
        })
    }

    fn sample() -> Vec<Record> {
        vec![
            activity("1", ActivityType::Brushing, "2024-03-01"),
            activity("2", ActivityType::Drinking, "2024-03-01"),
            activity("3", ActivityType::Headbutt, "2024-03-02"),
            video("upload.mp4", "2024-03-01"),
            activity("4", ActivityType::Brushing, "2024-03-03"),
        ]
    }

    fn is_subsequence(sub: &[&Record], full: &[Record]) -> bool {
        let mut it = full.iter();
        sub.iter().all(|s| it.any(|f| std::ptr::eq(f, *s)))
    }

    // =============================================
    // 全体の性質
    // =============================================

    #[test]
    fn test_empty_criteria_is_identity() {
        let data = sample();
        let out = apply(&data, &Criteria::default());
        assert_eq!(out.len(), data.len());
        assert!(out.iter().zip(data.iter()).all(|(a, b)| std::ptr::eq(*a, b)));
    }

    #[test]
    fn test_result_is_ordered_subsequence() {
        let data = sample();
        let criteria_list = [
            Criteria::new().with_search("event"),
            Criteria::new().with_date(day("2024-03-01")),
            Criteria::new().with_activity_type(ActivityType::Brushing),
            Criteria::new()
                .with_search("2024")
                .with_activity_type(ActivityType::Brushing),
        ];
        for criteria in &criteria_list {
            let out = apply(&data, criteria);
            assert!(is_subsequence(&out, &data), "順序が崩れた: {:?}", criteria);
        }
    }

    #[test]
    fn test_apply_is_idempotent() {
        let data = sample();
        let criteria = Criteria::new().with_search("brush").with_date(day("2024-03-01"));
        let first: Vec<*const Record> = apply(&data, &criteria).into_iter().map(|r| r as *const _).collect();
        let second: Vec<*const Record> = apply(&data, &criteria).into_iter().map(|r| r as *const _).collect();
        assert_eq!(first, second);
    }

    // =============================================
    // 検索
    // =============================================

    #[test]
    fn test_search_scenario_brush() {
        let data = vec![
            activity("1", ActivityType::Brushing, "2024-03-01"),
            activity("2", ActivityType::Drinking, "2024-03-01"),
        ];
        let out = apply(&data, &Criteria::new().with_search("brush"));
        assert_eq!(out.len(), 1);
        assert!(std::ptr::eq(out[0], &data[0]));
    }

    #[test]
    fn test_whitespace_search_is_inactive() {
        let data = sample();
        let mut criteria = Criteria::new().with_search("  ");
        assert!(!criteria.is_active());
        assert!(!criteria.clear());
        assert_eq!(apply(&data, &criteria).len(), data.len());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let data = sample();
        let out = apply(&data, &Criteria::new().with_search("UPLOAD"));
        assert_eq!(out.len(), 1);
        assert!(out[0].as_video().is_some());
    }

    #[test]
    fn test_search_matches_have_containing_field() {
        let data = sample();
        let needle = "mp4";
        for record in apply(&data, &Criteria::new().with_search(needle)) {
            let fields = record.search_fields().unwrap();
            assert!(fields.iter().any(|f| f.to_lowercase().contains(needle)));
        }
    }

    #[test]
    fn test_search_excludes_unstringifiable_record() {
        let mut corrupt = ActivityRecord {
            camera: Some("cam-brush".into()),
            ..Default::default()
        };
        corrupt
            .extra
            .insert("Boxes".into(), FieldValue::Opaque(serde_json::json!({"x": 1})));
        let data = vec![
            Record::Activity(corrupt),
            activity("1", ActivityType::Brushing, "2024-03-01"),
        ];
        let out = apply(&data, &Criteria::new().with_search("brush"));
        assert_eq!(out.len(), 1);
        assert!(std::ptr::eq(out[0], &data[1]));

        // 検索以外の条件では除外されない
        assert_eq!(apply(&data, &Criteria::default()).len(), 2);
    }

    #[test]
    fn test_search_ignores_duration_placeholder() {
        let data = vec![Record::Activity(ActivityRecord {
            activity_type: Some(ActivityType::Headbutt),
            ..Default::default()
        })];
        assert!(apply(&data, &Criteria::new().with_search("-")).is_empty());
    }

    #[test]
    fn test_search_matches_numeric_extra() {
        let mut record = ActivityRecord::default();
        record.extra.insert("Frame".into(), FieldValue::Text("1234".into()));
        let data = vec![Record::Activity(record)];
        assert_eq!(apply(&data, &Criteria::new().with_search("23")).len(), 1);
    }

    // =============================================
    // 日付
    // =============================================

    #[test]
    fn test_date_fallback_scenario() {
        let data = vec![Record::Activity(ActivityRecord {
            uploaded_date: Some("2024-03-01".into()),
            ..Default::default()
        })];
        assert_eq!(apply(&data, &Criteria::new().with_date(day("2024-03-01"))).len(), 1);
        assert!(apply(&data, &Criteria::new().with_date(day("2024-03-02"))).is_empty());
    }

    #[test]
    fn test_date_ignores_time_of_day() {
        let data = vec![
            activity("1", ActivityType::Brushing, "2024-03-01 23:59:59"),
            activity("2", ActivityType::Brushing, "2024-03-01T06:00:00"),
            activity("3", ActivityType::Brushing, "20240301"),
        ];
        assert_eq!(apply(&data, &Criteria::new().with_date(day("2024-03-01"))).len(), 3);
    }

    #[test]
    fn test_date_excludes_records_without_date() {
        let data = vec![
            Record::Activity(ActivityRecord::default()),
            activity("1", ActivityType::Drinking, "not a date"),
        ];
        assert!(apply(&data, &Criteria::new().with_date(day("2024-03-01"))).is_empty());
    }

    #[test]
    fn test_date_applies_to_video_upload_date() {
        let data = sample();
        let out = apply(&data, &Criteria::new().with_date(day("2024-03-01")));
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.effective_date() == Some("2024-03-01")));
    }

    // =============================================
    // 行動種別
    // =============================================

    #[test]
    fn test_activity_type_exact_match_excludes_videos() {
        let data = sample();
        let out = apply(&data, &Criteria::new().with_activity_type(ActivityType::Brushing));
        assert_eq!(out.len(), 2);
        assert!(out
            .iter()
            .all(|r| r.activity_type() == Some(ActivityType::Brushing)));
    }

    #[test]
    fn test_activity_type_excludes_unknown() {
        let mut unknown = ActivityRecord::default();
        unknown
            .extra
            .insert("Activity-Type".into(), FieldValue::Text("Brushing ".into()));
        let data = vec![Record::Activity(unknown)];
        assert!(apply(&data, &Criteria::new().with_activity_type(ActivityType::Brushing)).is_empty());
    }

    // =============================================
    // 条件操作
    // =============================================

    #[test]
    fn test_clear_all_scenario() {
        let data = sample();
        let mut criteria = Criteria::new()
            .with_search("event")
            .with_date(day("2024-03-01"))
            .with_activity_type(ActivityType::Drinking);
        assert!(criteria.can_clear());
        assert!(criteria.clear());
        assert_eq!(criteria, Criteria::default());
        assert_eq!(apply(&data, &criteria).len(), data.len());
    }

    #[test]
    fn test_clear_is_suppressed_when_idle() {
        let mut criteria = Criteria::default();
        assert!(!criteria.can_clear());
        assert!(!criteria.clear());
    }

    #[test]
    fn test_setters_edit_one_field() {
        let mut criteria = Criteria::default();
        criteria.set_search("cam");
        criteria.set_activity_type(Some(ActivityType::Headbutt));
        assert_eq!(criteria.search, "cam");
        assert_eq!(criteria.date, None);
        criteria.set_activity_type(None);
        assert!(criteria.is_active());
        criteria.set_search("");
        assert!(!criteria.is_active());
    }

    #[test]
    fn test_canonical_day_formats() {
        let expected = day("2024-03-01");
        for input in [
            "2024-03-01",
            "20240301",
            "2024/03/01",
            "2024-03-01 12:30",
            "2024-03-01T12:30:00.250",
            "2024-03-01T12:30:00+09:00",
            " 2024-03-01 ",
        ] {
            assert_eq!(canonical_day(input), Some(expected), "入力: {}", input);
        }
        assert_eq!(canonical_day(""), None);
        assert_eq!(canonical_day("03/01/2024"), None);
    }

    #[test]
    fn test_format_day() {
        assert_eq!(format_day(day("2024-03-01")), "2024-03-01");
    }

    #[test]
    fn test_parse_criteria_date_error() {
        assert!(parse_criteria_date("yesterday").is_err());
    }
}
