// ==========================================
// 客户数据导入 - 运行配置
// ==========================================
// 职责: 单次导入运行的全部可调参数
// 红线: 配置在运行开始时冻结,运行中只读
// ==========================================

use crate::domain::types::CardMatchPolicy;
use serde::{Deserialize, Serialize};

/// 导入运行配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// 目标 website 分区
    pub website_id: i64,

    /// 目标 store 分区
    pub store_id: i64,

    /// 地址/卡文件中归属客户标识所在的列名
    pub customer_id_column: String,

    /// 归属客户查找使用的客户属性（与 CSV 标识列逗号分段一一对应）
    pub find_customer_by: Vec<String>,

    /// 客户文件缺少密码列时是否生成随机密码
    pub generate_passwords: bool,

    /// 新建客户后是否发送欢迎邮件
    pub send_welcome_email: bool,

    /// 干跑模式: 完整执行映射与对账,不落库
    pub dry_run: bool,

    /// 卡匹配策略（哈希去重 / 总是新建）
    pub card_match_policy: CardMatchPolicy,

    /// 已存在客户是否补丁 legacy_customer_id
    pub patch_existing_customers: bool,

    /// 自定义属性允许清单（清单外的未知列丢弃）
    pub custom_attributes: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            website_id: 1,
            store_id: 1,
            customer_id_column: "customer_id".to_string(),
            find_customer_by: vec!["old_customer_id".to_string()],
            generate_passwords: true,
            send_welcome_email: false,
            dry_run: false,
            card_match_policy: CardMatchPolicy::HashMatch,
            patch_existing_customers: true,
            custom_attributes: Vec::new(),
        }
    }
}
