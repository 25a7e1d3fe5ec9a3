// ==========================================
// 客户数据导入 - 数据仓储层
// ==========================================
// 职责: 数据访问接口与 rusqlite 实现
// 红线: Repository 不含业务规则
// ==========================================

pub mod customer_repo;
pub mod customer_repo_impl;
pub mod error;

// 重导出核心类型
pub use customer_repo::{AddressRepository, CardRepository, CustomerRepository};
pub use customer_repo_impl::{
    SqliteAddressRepository, SqliteCardRepository, SqliteCustomerRepository,
};
pub use error::{RepositoryError, RepositoryResult};
