// ==========================================
// 客户数据导入 - CSV 文件数据源实现
// ==========================================
// 职责: 读取 CSV 文件为原始行序列（首行为表头,由驱动器解释）
// 红线: 单元格不做修剪,不在此处做列数校验（列数不一致是行级错误）
// ==========================================

use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::CsvSource;

pub struct CsvFileSource;

impl CsvSource for CsvFileSource {
    fn read_all_rows(&self, file_path: &str) -> ImportResult<Vec<Vec<String>>> {
        let path = Path::new(file_path);

        // 步骤1: 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(file_path.to_string()));
        }

        // 步骤2: 检查扩展名
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if extension != "csv" {
            return Err(ImportError::UnsupportedFormat(file_path.to_string()));
        }

        // 步骤3: 逐行读取（flexible: 列数不一致的行原样返回,由驱动器拒绝）
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        debug!(file_path = file_path, rows = rows.len(), "CSV 文件读取完成");
        Ok(rows)
    }
}
