//! ペイロード正規化モジュール
//!
//! バックエンドから受け取ったゆるい型のレコード配列を
//! `Record` の列に変換する。
//!
//! ## 処理フロー
//! 1. テキストならJSONとしてデコード（二重エンコードも1段だけ剥がす）
//! 2. オブジェクト配列であることを確認
//! 3. 既知フィールドを型付きで取り出し、残りは `extra` に保持
//!
//! 既知フィールドに配列・オブジェクトが入っているレコードは壊れているとみなし、
//! そのレコードだけを除外する。

use crate::error::{Error, Result};
use crate::record::{
    keys, ActivityRecord, ActivityType, CowId, FieldValue, InferenceStatus, Record, RecordFamily,
    VideoRecord,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// バックエンドから受け取った生データ
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// 未デコードのレスポンスボディ
    Text(String),
    /// デコード済みの値
    Structured(Value),
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Structured(value)
    }
}

/// ペイロードを正規化する
///
/// # Errors
/// * `MalformedPayload` - テキストのデコード失敗
/// * `Backend` - `{"message": ...}` 形式のエラー応答
/// * `UnexpectedShape` - オブジェクト配列以外
pub fn normalize(payload: Payload, family: RecordFamily) -> Result<Vec<Record>> {
    let items = into_items(decode(payload)?)?;
    let mut records = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let map = match item {
            Value::Object(map) => map,
            other => {
                return Err(Error::UnexpectedShape(format!(
                    "element {} is {}, expected object",
                    index,
                    kind(&other)
                )))
            }
        };

        let normalized = match family {
            RecordFamily::Activity => normalize_activity(map).map(Record::Activity),
            RecordFamily::Video => normalize_video(map).map(Record::Video),
        };

        match normalized {
            Ok(record) => records.push(record),
            Err(CorruptField(field)) => {
                tracing::warn!(index, field = %field, ?family, "skipping corrupt record");
            }
        }
    }

    tracing::debug!(count = records.len(), ?family, "normalized payload");
    Ok(records)
}

/// 正規化に失敗したら空データとして扱う
///
/// 失敗内容はログに残す。呼び出し側は「データなし」として描画を続ける。
pub fn normalize_or_empty(payload: Payload, family: RecordFamily) -> Vec<Record> {
    match normalize(payload, family) {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(error = %e, ?family, "failed to normalize payload; treating dataset as empty");
            Vec::new()
        }
    }
}

fn decode(payload: Payload) -> Result<Value> {
    let value = match payload {
        Payload::Text(text) => parse_text(&text)?,
        Payload::Structured(value) => value,
    };

    // 文字列としてJSONが届いた場合
    match value {
        Value::String(inner) => parse_text(&inner),
        other => Ok(other),
    }
}

fn parse_text(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| Error::MalformedPayload(e.to_string()))
}

fn into_items(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(message)) => Err(Error::Backend(message.clone())),
            _ => Err(Error::UnexpectedShape("object, expected array".into())),
        },
        other => Err(Error::UnexpectedShape(format!(
            "{}, expected array",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 既知フィールドに文字列化できない値が入っていた
struct CorruptField(String);

/// フィールドを取り出しながら残りを `extra` にまとめる
struct Fields {
    map: Map<String, Value>,
}

impl Fields {
    fn new(map: Map<String, Value>) -> Self {
        Self { map }
    }

    fn take(&mut self, key: &str) -> std::result::Result<Option<String>, CorruptField> {
        match self.map.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => scalar_text(&value)
                .map(Some)
                .ok_or_else(|| CorruptField(key.to_string())),
        }
    }

    fn into_extra(self) -> BTreeMap<String, FieldValue> {
        self.map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let value = match scalar_text(&v) {
                    Some(text) => FieldValue::Text(text),
                    None => FieldValue::Opaque(v),
                };
                (k, value)
            })
            .collect()
    }
}

/// 文字列・数値・真偽値を文字列化
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn normalize_activity(map: Map<String, Value>) -> std::result::Result<ActivityRecord, CorruptField> {
    let mut fields = Fields::new(map);

    let single = fields.take(keys::COW_ID)?;
    let first = fields.take(keys::COW_ID_1)?;
    let second = fields.take(keys::COW_ID_2)?;
    let cow = match (single, first, second) {
        (Some(id), _, _) if !id.is_empty() => Some(CowId::Single(id)),
        (_, Some(a), Some(b)) => Some(CowId::Pair(a, b)),
        (_, Some(half), None) | (_, None, Some(half)) => Some(CowId::Single(half)),
        (Some(id), None, None) => Some(CowId::Single(id)),
        (None, None, None) => None,
    };

    let raw_activity = fields.take(keys::ACTIVITY_TYPE)?;
    let activity_type = raw_activity.as_deref().and_then(ActivityType::from_wire);

    let mut record = ActivityRecord {
        cow,
        video_name: fields.take(keys::VIDEO_NAME)?,
        captured_date: fields.take(keys::CAPTURED_DATE)?,
        captured_time: fields.take(keys::CAPTURED_TIME)?,
        uploaded_date: fields.take(keys::UPLOADED_DATE)?,
        uploaded_time: fields.take(keys::UPLOADED_TIME)?,
        camera: fields.take(keys::CAMERA)?,
        activity_type,
        duration: fields.take(keys::DURATION)?,
        time_of_occurrence: fields.take(keys::TIME_OF_OCCURRENCE)?,
        extra: fields.into_extra(),
    };

    // 未知の行動種別は検索対象として残す
    if activity_type.is_none() {
        if let Some(raw) = raw_activity {
            record
                .extra
                .insert(keys::ACTIVITY_TYPE.to_string(), FieldValue::Text(raw));
        }
    }

    Ok(record)
}

fn normalize_video(map: Map<String, Value>) -> std::result::Result<VideoRecord, CorruptField> {
    let mut fields = Fields::new(map);

    Ok(VideoRecord {
        video_name: fields.take(keys::VIDEO_NAME)?,
        upload_date: fields.take(keys::VIDEO_DATE)?,
        upload_time: fields.take(keys::VIDEO_TIME)?,
        preview_video: fields.take(keys::PREVIEW_VIDEO)?,
        inference_status: fields
            .take(keys::INFERENCE_STATUS)?
            .map(|s| InferenceStatus::from_wire(&s)),
        extra: fields.into_extra(),
    })
}
