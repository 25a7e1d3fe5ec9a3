// ==========================================
// 客户数据导入 - 领域模型
// ==========================================
// 职责: 原始行 / 规范实体 / 运行汇总
// 生命周期: 实体逐行构造,交给仓储后即丢弃;
//           跨行只保留计数器与被拒绝行列表
// ==========================================

use crate::domain::types::{EntityKind, ImportOutcome, RejectReason};
use serde::{Deserialize, Serialize};

/// 空电话的哨兵值（下游校验要求电话非空）
pub const TELEPHONE_PLACEHOLDER: &str = "000-000-0000";

/// CSV 中表示空值的哨兵字符串
pub const NULL_SENTINEL: &str = "NULL";

// ==========================================
// RawRow - 原始行
// ==========================================
// 用途: 表头与数据行按列位置拉链后的有序键值对
// 说明: 保留列顺序（street 拼接依赖源文件列顺序）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRow {
    /// (列名, 原始值) 按源文件列顺序
    pub columns: Vec<(String, String)>,

    /// 原始文件行号（表头为第 1 行,数据从第 2 行起）
    pub row_number: usize,
}

impl RawRow {
    pub fn new(columns: Vec<(String, String)>, row_number: usize) -> Self {
        Self {
            columns,
            row_number,
        }
    }

    /// 按列名取原始值（首个匹配列）
    pub fn get(&self, key: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 按列名取值,空串与 NULL 哨兵视为缺失
    pub fn get_non_null(&self, key: &str) -> Option<&str> {
        self.get(key)
            .filter(|v| !v.is_empty() && *v != NULL_SENTINEL)
    }

    /// 原始单元格值（映射前,用于被拒绝行报告）
    pub fn raw_values(&self) -> Vec<String> {
        self.columns.iter().map(|(_, v)| v.clone()).collect()
    }
}

// ==========================================
// CanonicalCustomer - 规范客户实体
// ==========================================
// 不变量: email 已转小写,在 website 范围内作为自然键
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalCustomer {
    pub email: Option<String>,
    pub firstname: Option<String>,
    pub middlename: Option<String>,
    pub lastname: Option<String>,

    // 多租户分区
    pub website_id: i64,
    pub store_id: i64,

    /// 迁移源系统的旧客户 ID（允许清单内的补丁字段）
    pub legacy_customer_id: Option<String>,

    /// 显式实体 ID（源系统 wcsid 列,保留原主键时使用）
    pub entity_id: Option<i64>,

    /// 生成或源文件提供的明文密码（由仓储散列后落库）
    pub password: Option<String>,

    pub group_id: Option<String>,
    pub created_at: Option<String>,

    /// 允许清单内的自定义属性（映射时校验）
    pub custom_attributes: Vec<(String, String)>,
}

// ==========================================
// CanonicalAddress - 规范地址实体
// ==========================================
// 不变量: region_id 若有值,region 必为同一地区的规范显示名
// 不变量: telephone 永不为空（空值映射为哨兵 000-000-0000）
// 不变量: street 至多两个物理行（第三行及 suite 以空格并入）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalAddress {
    pub firstname: Option<String>,
    pub middlename: Option<String>,
    pub lastname: Option<String>,
    pub company: Option<String>,

    /// 最多两行,换行符连接
    pub street: Option<String>,
    pub city: Option<String>,

    /// 地区显示名（美国行为目录规范名,其他国家为首字母大写的原值）
    pub region: Option<String>,
    /// 地区数值 ID（仅美国行有值）
    pub region_id: Option<i64>,

    pub postcode: Option<String>,
    /// ISO 国家代码（由国家目录解析）
    pub country_id: Option<String>,
    pub telephone: Option<String>,

    pub created_at: Option<String>,
    pub updated_at: Option<String>,

    pub custom_attributes: Vec<(String, String)>,
}

// ==========================================
// CanonicalCard - 规范存储卡实体
// ==========================================
// 不变量: masked_number 仅暴露前 2 位与源串第 3-4 位,中间为固定掩码
// 不变量: public_hash 由网关令牌确定性派生（存在性查找不暴露令牌）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalCard {
    pub gateway_token: Option<String>,
    pub brand: Option<String>,
    pub masked_number: Option<String>,
    pub expiry_month: Option<String>,
    pub expiry_year: Option<String>,
    pub currency: Option<String>,

    /// hex(SHA-256(gateway_token)),存在性查找键（按客户范围）
    pub public_hash: Option<String>,

    /// 归属客户（Run Driver 查找后填入）
    pub customer_id: Option<i64>,
}

impl CanonicalCard {
    /// 过期日期 MMYY 格式（月份补零 + 年份后两位）
    pub fn expiry_mmyy(&self) -> Option<String> {
        let month = self.expiry_month.as_deref()?.parse::<u32>().ok()?;
        let year = self.expiry_year.as_deref()?;
        if year.len() < 4 {
            return None;
        }
        Some(format!("{:02}{}", month, &year[2..4]))
    }
}

// ==========================================
// CustomerRecord - 客户读模型
// ==========================================
// 用途: 按属性查找客户的返回值（地址/卡行的归属判定）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub entity_id: i64,
    pub email: String,
    pub website_id: i64,
    pub legacy_customer_id: Option<String>,
}

// ==========================================
// CustomerPatch - 已存在客户的补丁
// ==========================================
// 允许清单: 仅 legacy_customer_id（不做整体覆盖）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerPatch {
    pub legacy_customer_id: Option<String>,
}

// ==========================================
// RejectedRow - 被拒绝行
// ==========================================
// 用途: 报告原始值（映射前）,进入 RunSummary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRow {
    pub row_number: usize,
    /// 原始单元格值,未经任何规范化
    pub raw_cells: Vec<String>,
    pub reason: RejectReason,
}

// ==========================================
// RunSummary - 导入运行汇总
// ==========================================
// 核心只产出结构化汇总,打印/落日志由 Reporter 协作方完成
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub entity_kind: EntityKind,
    pub total_rows: usize,
    pub created: usize,
    pub skipped_existing: usize,
    pub rejected: usize,
    /// 找不到归属客户而静默跳过的行数（不计为错误）
    pub orphan_skipped: usize,
    pub elapsed_ms: u128,
    pub dry_run: bool,
    /// 运行是否被协作式取消（汇总为取消点之前的部分结果）
    pub cancelled: bool,
    pub rejected_rows: Vec<RejectedRow>,
}

impl RunSummary {
    pub fn new(entity_kind: EntityKind, dry_run: bool) -> Self {
        Self {
            entity_kind,
            total_rows: 0,
            created: 0,
            skipped_existing: 0,
            rejected: 0,
            orphan_skipped: 0,
            elapsed_ms: 0,
            dry_run,
            cancelled: false,
            rejected_rows: Vec::new(),
        }
    }

    /// 记录一行的导入结果
    pub fn record(&mut self, raw_row: &RawRow, outcome: ImportOutcome) {
        match outcome {
            ImportOutcome::Created(_) => self.created += 1,
            ImportOutcome::SkippedExisting(_) => self.skipped_existing += 1,
            ImportOutcome::Rejected(reason) => {
                self.push_rejected(raw_row.row_number, raw_row.raw_values(), reason);
            }
        }
    }

    /// 记录一条被拒绝行（原始值 + 原因）
    pub fn push_rejected(
        &mut self,
        row_number: usize,
        raw_cells: Vec<String>,
        reason: RejectReason,
    ) {
        self.rejected += 1;
        self.rejected_rows.push(RejectedRow {
            row_number,
            raw_cells,
            reason,
        });
    }
}
