//! Excel出力（CLI版）
//!
//! 生成は共通ライブラリに任せ、ここではファイルへの書き込みだけを行う

use crate::error::{ConsoleError, Result};
use barn_console_common::export::excel_core::{generate_table_buffer, TableRow};
use std::path::Path;

pub fn write_table<T: TableRow>(rows: &[T], output_path: &Path, title: &str) -> Result<()> {
    let buffer = generate_table_buffer(title, rows).map_err(ConsoleError::Export)?;
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output_path, buffer)?;
    tracing::debug!(path = %output_path.display(), rows = rows.len(), "excel written");
    Ok(())
}
