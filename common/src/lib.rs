//! Barn Console Common Library
//!
//! 行動イベント・動画レコードの正規化、フィルタ、推論状態の導出。
//! 通信や画面描画には依存しない。

pub mod error;
pub mod record;
pub mod normalizer;
pub mod filter;
pub mod lifecycle;
pub mod dataset;
pub mod display;
pub mod media;
pub mod export;

pub use error::{Error, Result};
pub use record::{ActivityRecord, ActivityType, CowId, FieldValue, InferenceStatus, Record, RecordFamily, VideoRecord};
pub use normalizer::{normalize, normalize_or_empty, Payload};
pub use filter::{apply, canonical_day, format_day, parse_criteria_date, Criteria};
pub use lifecycle::{InferenceTracker, LifecycleError, LifecycleState, PendingInference};
pub use dataset::{DatasetSlot, FetchOutcome, FetchTicket};
pub use display::{activity_rows, video_rows_newest_first, ActivityRow, VideoRow, PLACEHOLDER};
pub use media::MediaLocator;
