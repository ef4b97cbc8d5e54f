//! Excel生成（共通ライブラリ）
//!
//! フィルタ後のテーブルをそのまま1シートのExcelに書き出す

use crate::display::{ActivityRow, VideoRow, ACTIVITY_HEADERS, VIDEO_HEADERS};
use rust_xlsxwriter::*;

/// シート名の最大長（Excelの制限）
const MAX_SHEET_NAME: usize = 31;

/// 1行分のセルを返すトレイト（行動イベント行・動画行に対応）
pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<&str>;
}

impl TableRow for ActivityRow {
    fn headers() -> &'static [&'static str] { &ACTIVITY_HEADERS }
    fn cells(&self) -> Vec<&str> { ActivityRow::cells(self).to_vec() }
}

impl TableRow for VideoRow {
    fn headers() -> &'static [&'static str] { &VIDEO_HEADERS }
    fn cells(&self) -> Vec<&str> { VideoRow::cells(self).to_vec() }
}

/// Excelをバッファに生成
///
/// # Arguments
/// * `title` - シート名（31文字で切り詰め）
/// * `rows` - 表示行（TableRowトレイトを実装した型）
pub fn generate_table_buffer<T: TableRow>(title: &str, rows: &[T]) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    // フォーマット定義
    let header_format = Format::new()
        .set_bold()
        .set_font_size(10.0)
        .set_font_color(Color::RGB(0x555555))
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xAAAAAA));

    let value_format = Format::new()
        .set_font_size(11.0)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let sheet_name: String = title.chars().take(MAX_SHEET_NAME).collect();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&sheet_name)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    // ヘッダー行
    let headers = T::headers();
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
    }

    // データ行
    for (idx, row) in rows.iter().enumerate() {
        let row_num = (idx + 1) as u32;
        for (col, value) in row.cells().into_iter().enumerate() {
            worksheet.write_string_with_format(row_num, col as u16, value, &value_format)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
        }
    }

    // 見出しを固定し、列幅を内容に合わせる
    worksheet.set_freeze_panes(1, 0)
        .map_err(|e| format!("ウィンドウ枠固定エラー: {}", e))?;
    worksheet.autofit();

    // バッファに書き出し
    workbook.save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}
