//! 表格导出 - 业务能力层
//!
//! 把最终测试用例写成一个带格式的 Excel 工作簿（或 CSV）。
//! 列宽按内容计算，行高按最多行数计算；先写到目标目录下的临时文件，成功后再改名，
//! 失败时不会留下半成品。

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use phf::phf_map;
use regex::Regex;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, XlsxError};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ExportError;
use crate::models::{Label, TestCase};

/// 工作表名称
pub const SHEET_NAME: &str = "Test_Cases";

/// 表头（固定顺序）
pub const CANONICAL_HEADERS: [&str; 15] = [
    "Test_Case_ID",
    "Test_Case_Name",
    "Feature_ID",
    "Feature_Name",
    "Module",
    "Test_Type",
    "Priority",
    "Category",
    "Gap_Coverage",
    "Preconditions",
    "Steps",
    "Test_Data",
    "Expected_Result",
    "FRD_Reference",
    "Generated_On",
];

/// 重要列的最小宽度（`Description` 目前不在表头中，保留以便日后加列）
pub static MIN_COLUMN_WIDTHS: phf::Map<&'static str, f64> = phf_map! {
    "Steps" => 80.0,
    "Test_Case_Name" => 40.0,
    "Expected_Result" => 50.0,
    "Description" => 40.0,
    "Preconditions" => 30.0,
};

/// 每行文本的高度（磅）
pub const LINE_HEIGHT: f64 = 15.0;

const HEADER_FILL: u32 = 0x366092;
const GENERATED_ON_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

// ========== 布局计算 ==========

/// 单元格内容宽度：多行文本取最长一行，否则取字符数
pub fn content_width(text: &str) -> usize {
    if text.contains('\n') {
        text.lines().map(|line| line.chars().count()).max().unwrap_or(0)
    } else {
        text.chars().count()
    }
}

/// 按内容长度加留白：短内容多留，长内容封顶 100
pub fn scaled_width(max_len: usize) -> f64 {
    let width = if max_len < 15 {
        max_len + 5
    } else if max_len < 50 {
        max_len + 3
    } else {
        (max_len + 2).min(100)
    };
    width as f64
}

/// 计算每一列的宽度（包含表头），再套用最小宽度
pub fn column_widths(rows: &[[String; 15]]) -> [f64; 15] {
    let mut widths = [0.0; 15];
    for (col, header) in CANONICAL_HEADERS.iter().enumerate() {
        let max_len = rows
            .iter()
            .map(|row| content_width(&row[col]))
            .chain(std::iter::once(content_width(header)))
            .max()
            .unwrap_or(0);

        let scaled = scaled_width(max_len);
        widths[col] = match MIN_COLUMN_WIDTHS.get(*header) {
            Some(min) => scaled.max(*min),
            None => scaled,
        };
    }
    widths
}

/// 行高 = 行内最多的文本行数 × 15
pub fn row_height(row: &[String]) -> f64 {
    let max_lines = row
        .iter()
        .map(|cell| cell.split('\n').count())
        .max()
        .unwrap_or(1)
        .max(1);
    max_lines as f64 * LINE_HEIGHT
}

/// 一行导出数据，顺序与 [`CANONICAL_HEADERS`] 一致
///
/// `index` 从 1 开始；缺少编号的测试用例按行号补成 `TC<nnn>`。
pub fn export_row(tc: &TestCase, index: usize) -> [String; 15] {
    let test_case_id = if tc.test_case_id.trim().is_empty() {
        format!("TC{:03}", index)
    } else {
        tc.test_case_id.clone()
    };

    [
        test_case_id,
        tc.test_case_name.clone(),
        tc.feature_id.clone(),
        tc.feature_name.clone(),
        tc.module.clone(),
        tc.test_type.as_ref().map(Label::to_string).unwrap_or_default(),
        tc.priority.as_ref().map(Label::to_string).unwrap_or_default(),
        tc.category.clone(),
        tc.gap_coverage.clone(),
        tc.preconditions.clone(),
        tc.steps.clone(),
        tc.test_data.clone(),
        tc.expected_result.clone(),
        tc.source_reference.clone(),
        tc.generated_at.format(GENERATED_ON_FORMAT).to_string(),
    ]
}

/// 默认文件名：`generated_testcases_<YYYYMMDD_HHMMSS>.<ext>`
pub fn default_filename(format: ExportFormat) -> String {
    format!(
        "generated_testcases_{}.{}",
        Local::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// 清理调用方给出的文件名：去掉路径部分和非法字符，并强制使用导出格式的扩展名
pub fn sanitize_filename(name: &str, format: ExportFormat) -> String {
    let base = Path::new(name.trim())
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let cleaned = match Regex::new(r"[^A-Za-z0-9._\- ]+") {
        Ok(re) => re.replace_all(base, "_").trim().to_string(),
        Err(_) => base.to_string(),
    };

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.' || c == '_') {
        default_filename(format)
    } else {
        format!("{}.{}", cleaned, format.extension())
    }
}

// ========== 导出器 ==========

/// 表格导出器
#[derive(Debug, Clone)]
pub struct SpreadsheetExporter {
    download_folder: PathBuf,
    format: ExportFormat,
}

impl SpreadsheetExporter {
    pub fn new(download_folder: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            download_folder: download_folder.into(),
            format,
        }
    }

    /// 导出测试用例，返回最终文件路径
    ///
    /// 同步执行（文件 IO），异步调用方应放到 `spawn_blocking` 中。
    pub fn export(
        &self,
        test_cases: &[TestCase],
        filename: Option<&str>,
    ) -> Result<PathBuf, ExportError> {
        self.export_unless_cancelled(test_cases, filename, &AtomicBool::new(false))
    }

    /// 同 [`Self::export`]，改名前后检查 `cancelled`
    ///
    /// 已取消时删除临时文件或刚改名的文件，返回 [`ExportError::Cancelled`]。
    pub fn export_unless_cancelled(
        &self,
        test_cases: &[TestCase],
        filename: Option<&str>,
        cancelled: &AtomicBool,
    ) -> Result<PathBuf, ExportError> {
        if test_cases.is_empty() {
            return Err(ExportError::NoTestCases);
        }

        fs::create_dir_all(&self.download_folder).map_err(|source| ExportError::Io {
            path: self.download_folder.clone(),
            source,
        })?;

        let filename = match filename {
            Some(name) => sanitize_filename(name, self.format),
            None => default_filename(self.format),
        };
        let final_path = self.download_folder.join(&filename);
        let temp_path = self.download_folder.join(format!(".{}.partial", filename));

        let rows: Vec<[String; 15]> = test_cases
            .iter()
            .enumerate()
            .map(|(i, tc)| export_row(tc, i + 1))
            .collect();

        debug!(
            "写入 {} 行到临时文件: {}",
            rows.len(),
            temp_path.display()
        );

        let written = match self.format {
            ExportFormat::Xlsx => write_workbook(&rows, &temp_path).map_err(|source| {
                ExportError::WorkbookFailed {
                    path: final_path.clone(),
                    source,
                }
            }),
            ExportFormat::Csv => {
                write_csv(&rows, &temp_path).map_err(|source| ExportError::CsvFailed {
                    path: final_path.clone(),
                    source,
                })
            }
        };

        if let Err(e) = written {
            discard(&temp_path);
            return Err(e);
        }

        if cancelled.load(Ordering::SeqCst) {
            discard(&temp_path);
            return Err(ExportError::Cancelled);
        }

        if let Err(source) = fs::rename(&temp_path, &final_path) {
            discard(&temp_path);
            return Err(ExportError::Io {
                path: final_path,
                source,
            });
        }

        if cancelled.load(Ordering::SeqCst) {
            discard(&final_path);
            return Err(ExportError::Cancelled);
        }

        info!("💾 已导出 {} 个测试用例: {}", rows.len(), final_path.display());
        Ok(final_path)
    }
}

fn write_workbook(rows: &[[String; 15]], path: &Path) -> Result<(), XlsxError> {
    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center);
    let cell_format = Format::new().set_text_wrap().set_align(FormatAlign::Top);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in CANONICAL_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let row_index = (i + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            worksheet.write_string_with_format(row_index, col as u16, value, &cell_format)?;
        }
        worksheet.set_row_height(row_index, row_height(row))?;
    }

    for (col, width) in column_widths(rows).iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    workbook.save(path)
}

fn write_csv(rows: &[[String; 15]], path: &Path) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CANONICAL_HEADERS)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("⚠️ 无法删除临时文件 {}: {}", path.display(), e);
        }
    }
}
