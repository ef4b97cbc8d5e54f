//! 表示中のテーブルのファイル出力
//!
//! - JSON: バックエンドと同じキーのレコード配列（絞り込み後）
//! - Excel: 画面と同じ列構成の1シート

pub mod excel;
pub mod json;

use crate::cli::ExportFormat;
use crate::error::Result;
use barn_console_common::{ActivityRow, Record, VideoRow};
use std::path::{Path, PathBuf};

/// 出力先がフォルダか拡張子なしなら `<title>.<ext>` を付ける
pub fn output_path_for_format(output: &Path, title: &str, format: ExportFormat) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", title, format.extension()))
    } else {
        output.to_path_buf()
    }
}

/// 出力時のタイトル（シート名・既定ファイル名）
pub fn default_title(kind: &str) -> String {
    format!("{}_{}", kind, chrono::Local::now().format("%Y%m%d"))
}

pub fn export_events(
    records: &[&Record],
    rows: &[ActivityRow],
    format: ExportFormat,
    output: &Path,
) -> Result<PathBuf> {
    let title = default_title("events");
    let output_path = output_path_for_format(output, &title, format);
    match format {
        ExportFormat::Json => {
            println!("- JSONを生成中...");
            json::write_records(records, &output_path)?;
        }
        ExportFormat::Excel => {
            println!("- Excelを生成中...");
            excel::write_table(rows, &output_path, &title)?;
        }
    }
    println!("✔ 出力: {} ({}件)", output_path.display(), records.len());
    Ok(output_path)
}

pub fn export_videos(
    records: &[&Record],
    rows: &[VideoRow],
    format: ExportFormat,
    output: &Path,
) -> Result<PathBuf> {
    let title = default_title("videos");
    let output_path = output_path_for_format(output, &title, format);
    match format {
        ExportFormat::Json => json::write_records(records, &output_path)?,
        ExportFormat::Excel => excel::write_table(rows, &output_path, &title)?,
    }
    println!("✔ 出力: {} ({}件)", output_path.display(), records.len());
    Ok(output_path)
}
