// ==========================================
// 电商平台客户数据批量导入 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 迁移工具,CSV 批量导入与按自然键去重
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - CSV 读取/映射/去重/编排
pub mod importer;

// 配置层 - 运行配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    CardMatchPolicy, EntityKind, ImportOutcome, ReconcileDecision, RejectReason,
};

// 领域实体
pub use domain::{
    CanonicalAddress, CanonicalCard, CanonicalCustomer, CustomerPatch, CustomerRecord, RawRow,
    RejectedRow, RunSummary,
};

// 配置
pub use config::ImportConfig;

// 导入引擎
pub use importer::{
    CsvFileSource, CsvSource, DirectoryResolver, FieldNormalizer, ImportError, ImportResult,
    ImportRunner, LogReporter, NoopEmailSender, Reconciler, Reporter, RowMapper,
    WelcomeEmailSender,
};

// 仓储
pub use repository::{
    AddressRepository, CardRepository, CustomerRepository, RepositoryError, RepositoryResult,
    SqliteAddressRepository, SqliteCardRepository, SqliteCustomerRepository,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "客户数据批量导入";
