// ==========================================
// 客户数据导入 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod customer;
pub mod types;

// 重导出核心类型
pub use customer::{
    CanonicalAddress, CanonicalCard, CanonicalCustomer, CustomerPatch, CustomerRecord, RawRow,
    RejectedRow, RunSummary, NULL_SENTINEL, TELEPHONE_PLACEHOLDER,
};
pub use types::{CardMatchPolicy, EntityKind, ImportOutcome, ReconcileDecision, RejectReason};
