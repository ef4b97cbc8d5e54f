//! データセット保持とフェッチ順序管理
//!
//! 取得結果は丸ごと置き換える（マージしない）。
//! 複数の取得が並行した場合に古い応答で上書きしないよう、
//! 取得ごとに単調増加のチケットを振り、最新より古い結果は捨てる。

use crate::record::{Record, RecordFamily};

/// 取得リクエストの通し番号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// 取得結果の反映結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// データセットを置き換えた
    Applied { records: usize },
    /// より新しい結果が反映済みのため破棄した
    Stale,
}

/// 1種類のレコード列を保持するスロット
#[derive(Debug, Clone)]
pub struct DatasetSlot {
    family: RecordFamily,
    records: Vec<Record>,
    issued: u64,
    applied: u64,
}

impl DatasetSlot {
    pub fn new(family: RecordFamily) -> Self {
        Self {
            family,
            records: Vec::new(),
            issued: 0,
            applied: 0,
        }
    }

    /// 新しい取得を開始する
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// 取得結果を反映する
    ///
    /// 反映済みの結果より古いチケットなら何もしない。
    pub fn complete(&mut self, ticket: FetchTicket, records: Vec<Record>) -> FetchOutcome {
        if ticket.0 <= self.applied {
            tracing::debug!(
                ticket = ticket.0,
                applied = self.applied,
                family = ?self.family,
                "discarding stale fetch result"
            );
            return FetchOutcome::Stale;
        }
        self.applied = ticket.0;
        self.records = records;
        FetchOutcome::Applied {
            records: self.records.len(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

}
