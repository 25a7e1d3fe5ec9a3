// ==========================================
// 客户数据导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 行级错误与致命错误分离（见 RepositoryError::is_fatal）
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 行级校验错误 =====
    #[error("字段校验失败 (行 {row}, 字段 {field}): {message}")]
    Validation {
        row: usize,
        field: String,
        message: String,
    },

    #[error("行长度不一致 (行 {row}): 期望 {expected} 列, 实际 {actual} 列")]
    MalformedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    // ===== 仓储错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为致命错误（中止整个运行,而不是拒绝单行）
    pub fn is_fatal(&self) -> bool {
        matches!(self, ImportError::Repository(e) if e.is_fatal())
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
