// ==========================================
// 客户数据导入 - 仓储接口定义
// ==========================================
// 职责: 三类实体的查找与写入抽象（去重引擎与运行驱动器依赖）
// 红线: 接口不暴露 SQL 细节; 自然键查找语义在接口文档中约定
// ==========================================

use async_trait::async_trait;

use crate::domain::customer::{
    CanonicalAddress, CanonicalCard, CanonicalCustomer, CustomerPatch, CustomerRecord,
};
use crate::repository::error::RepositoryResult;

/// 客户仓储接口
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// 按属性组查找客户,限定 website 范围
    ///
    /// attributes 与 values 一一对应（AND 语义）。
    /// 支持的属性: email / entity_id / legacy_customer_id。
    async fn find_by_attributes(
        &self,
        attributes: &[String],
        values: &[String],
        website_id: i64,
    ) -> RepositoryResult<Option<CustomerRecord>>;

    /// 新建客户,返回实体 ID
    async fn create(&self, customer: &CanonicalCustomer) -> RepositoryResult<i64>;

    /// 按允许清单对已有客户打补丁（不做整体覆盖）
    async fn update(&self, entity_id: i64, patch: &CustomerPatch) -> RepositoryResult<()>;
}

/// 地址仓储接口
#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// 自然键存在性查找: (parent_id, firstname, lastname, street,
    /// city, region, postcode, country_id) 全字段精确相等
    async fn find_by_natural_key(
        &self,
        parent_id: i64,
        address: &CanonicalAddress,
    ) -> RepositoryResult<Option<i64>>;

    /// 新建地址,返回实体 ID
    async fn create(&self, parent_id: i64, address: &CanonicalAddress) -> RepositoryResult<i64>;
}

/// 存储卡仓储接口
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// 按 (customer_id, public_hash) 存在性查找
    async fn find_by_public_hash(
        &self,
        customer_id: i64,
        public_hash: &str,
    ) -> RepositoryResult<Option<i64>>;

    /// 新建存储卡,返回记录 ID
    async fn create(&self, card: &CanonicalCard) -> RepositoryResult<i64>;
}
