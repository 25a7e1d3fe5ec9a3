// ==========================================
// 客户数据导入 - 导入引擎层
// ==========================================
// 职责: CSV 读取、字段规范化、行映射、去重判定、运行编排
// 数据流: CSV 行 → RowMapper（借助 DirectoryResolver）→ 规范实体
//         → Reconciler（借助仓储查找）→ 写入副作用 → RunSummary
// ==========================================

pub mod csv_source;
pub mod directory;
pub mod error;
pub mod importer_trait;
pub mod normalizer;
pub mod reconciler;
pub mod reporter;
pub mod row_mapper;
pub mod runner;

// 重导出核心类型
pub use csv_source::CsvFileSource;
pub use directory::{CountryRecord, DirectoryResolver, RegionRecord};
pub use error::{ImportError, ImportResult};
pub use importer_trait::{CsvSource, Reporter, WelcomeEmailSender};
pub use normalizer::FieldNormalizer;
pub use reconciler::Reconciler;
pub use reporter::{LogReporter, NoopEmailSender};
pub use row_mapper::RowMapper;
pub use runner::ImportRunner;
