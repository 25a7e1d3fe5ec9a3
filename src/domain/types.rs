// ==========================================
// 客户数据导入 - 领域类型定义
// ==========================================
// 职责: 导入结果/判定枚举（跨模块共享）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 实体类别 (Entity Kind)
// ==========================================
// 三种导入流共用同一套引擎,按实体类别区分必填字段集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Customer, // 客户主数据
    Address,  // 客户地址
    Card,     // 存储支付卡
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Customer => write!(f, "CUSTOMER"),
            EntityKind::Address => write!(f, "ADDRESS"),
            EntityKind::Card => write!(f, "CARD"),
        }
    }
}

// ==========================================
// 卡去重策略 (Card Match Policy)
// ==========================================
// 历史上存在两个版本的卡导入命令:
// - AlwaysCreate: 永不判定已存在（旧版兼容行为,仅用于历史测试数据）
// - HashMatch: 按 (customer_id, public_hash) 判定已存在（修正版,默认）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardMatchPolicy {
    AlwaysCreate,
    HashMatch,
}

impl fmt::Display for CardMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardMatchPolicy::AlwaysCreate => write!(f, "ALWAYS_CREATE"),
            CardMatchPolicy::HashMatch => write!(f, "HASH_MATCH"),
        }
    }
}

// ==========================================
// 拒绝原因 (Reject Reason)
// ==========================================
// 行级拒绝的结构化原因（进入 RunSummary.rejected_rows）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// 必填字段缺失（映射后的规范实体里该字段为空）
    MissingRequiredField { field: String },

    /// 字段校验失败（国家/地区无法识别等）
    Validation { field: String, message: String },

    /// 行长度与表头不一致
    MalformedRow { expected: usize, actual: usize },

    /// 持久化写入失败（非致命,行级拒绝）
    Persistence { message: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingRequiredField { field } => {
                write!(f, "必填字段缺失: {}", field)
            }
            RejectReason::Validation { field, message } => {
                write!(f, "字段校验失败 ({}): {}", field, message)
            }
            RejectReason::MalformedRow { expected, actual } => {
                write!(f, "行长度不一致: 期望 {} 列, 实际 {} 列", expected, actual)
            }
            RejectReason::Persistence { message } => {
                write!(f, "持久化失败: {}", message)
            }
        }
    }
}

// ==========================================
// 单行导入结果 (Import Outcome)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportOutcome {
    /// 新建实体（附持久化返回的 id; 干跑模式下为 0）
    Created(i64),

    /// 按自然键命中已有实体,跳过（可能伴随允许清单内的补丁更新）
    SkippedExisting(i64),

    /// 行被拒绝,原始值保留用于报告
    Rejected(RejectReason),
}

// ==========================================
// 去重判定 (Reconcile Decision)
// ==========================================
// 去重引擎只做判定,不做写入; 写入由 Run Driver 执行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileDecision {
    /// 自然键未命中,应新建
    Create,

    /// 自然键命中,跳过（不更新）
    SkipExisting { existing_id: i64 },

    /// 自然键命中,按允许清单打补丁后仍计入"已存在跳过"
    /// （历史共享代码路径的副作用,按 patch_existing_customers 开关隔离）
    PatchExisting {
        existing_id: i64,
        legacy_customer_id: Option<String>,
    },

    /// 必填字段缺失或校验失败,拒绝
    Reject(RejectReason),
}
