use crate::error::Result;
use barn_console_common::Record;
use serde_json::Value;
use std::path::Path;

/// レコードをバックエンドと同じ形のJSON配列で書き出す
pub fn write_records(records: &[&Record], output_path: &Path) -> Result<()> {
    let values: Vec<Value> = records.iter().map(|r| r.to_wire()).collect();
    let content = serde_json::to_string_pretty(&values)?;
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output_path, content)?;
    Ok(())
}
