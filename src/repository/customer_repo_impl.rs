// ==========================================
// 客户数据导入 - 仓储实现（rusqlite）
// ==========================================
// 职责: 实现三类实体的数据访问
// 红线: Repository 不含业务规则,只做数据 CRUD;
//       地址自然键查找用 IS 比较,NULL 字段也参与精确相等
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::db::open_sqlite_connection;
use crate::domain::customer::{
    CanonicalAddress, CanonicalCard, CanonicalCustomer, CustomerPatch, CustomerRecord,
};
use crate::repository::customer_repo::{AddressRepository, CardRepository, CustomerRepository};
use crate::repository::error::{RepositoryError, RepositoryResult};

/// 存储卡落库时的固定支付网关代码
const PAYMENT_METHOD_CODE: &str = "tns";

/// 存储卡令牌类型
const TOKEN_TYPE_CARD: &str = "card";

/// 查找属性名 → customer_entity 列名
fn lookup_column(attribute: &str) -> RepositoryResult<&'static str> {
    match attribute {
        "email" => Ok("email"),
        "entity_id" | "wcsid" => Ok("entity_id"),
        "legacy_customer_id" | "old_customer_id" => Ok("legacy_customer_id"),
        other => Err(RepositoryError::UnsupportedLookupAttribute(
            other.to_string(),
        )),
    }
}

// ==========================================
// SqliteCustomerRepository
// ==========================================
pub struct SqliteCustomerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCustomerRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl CustomerRepository for SqliteCustomerRepository {
    async fn find_by_attributes(
        &self,
        attributes: &[String],
        values: &[String],
        website_id: i64,
    ) -> RepositoryResult<Option<CustomerRecord>> {
        if attributes.is_empty() || attributes.len() != values.len() {
            return Err(RepositoryError::InternalError(format!(
                "查找属性与值数量不符: {} vs {}",
                attributes.len(),
                values.len()
            )));
        }

        let mut predicates: Vec<String> = Vec::with_capacity(attributes.len() + 1);
        for attribute in attributes {
            let column = lookup_column(attribute)?;
            predicates.push(format!("{} = ?", column));
        }
        predicates.push("website_id = ?".to_string());

        let sql = format!(
            "SELECT entity_id, email, website_id, legacy_customer_id FROM customer_entity WHERE {} LIMIT 1",
            predicates.join(" AND ")
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;

        let mut bind_values: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(values.len() + 1);
        for value in values {
            bind_values.push(value);
        }
        bind_values.push(&website_id);

        let record = stmt
            .query_row(bind_values.as_slice(), |row| {
                Ok(CustomerRecord {
                    entity_id: row.get(0)?,
                    email: row.get(1)?,
                    website_id: row.get(2)?,
                    legacy_customer_id: row.get(3)?,
                })
            })
            .optional()?;

        Ok(record)
    }

    async fn create(&self, customer: &CanonicalCustomer) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        // 明文密码不落库,散列后存储
        let password_hash = customer
            .password
            .as_deref()
            .map(|p| hex::encode(Sha256::digest(p.as_bytes())));

        let created_at = customer
            .created_at
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        tx.execute(
            r#"
            INSERT INTO customer_entity (
                entity_id, email, firstname, middlename, lastname,
                website_id, store_id, group_id, legacy_customer_id,
                password_hash, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                // 源系统保留主键（wcsid）,缺省时由 SQLite 自增
                customer.entity_id,
                customer.email,
                customer.firstname,
                customer.middlename,
                customer.lastname,
                customer.website_id,
                customer.store_id,
                customer.group_id,
                customer.legacy_customer_id,
                password_hash,
                created_at,
            ],
        )?;

        let entity_id = match customer.entity_id {
            Some(id) => id,
            None => tx.last_insert_rowid(),
        };

        for (code, value) in &customer.custom_attributes {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO customer_entity_attribute (entity_id, attribute_code, value)
                VALUES (?1, ?2, ?3)
                "#,
                params![entity_id, code, value],
            )?;
        }

        tx.commit()?;
        Ok(entity_id)
    }

    async fn update(&self, entity_id: i64, patch: &CustomerPatch) -> RepositoryResult<()> {
        // 补丁允许清单仅 legacy_customer_id
        let legacy = match patch.legacy_customer_id.as_deref() {
            Some(v) => v,
            None => return Ok(()),
        };

        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE customer_entity SET legacy_customer_id = ?1 WHERE entity_id = ?2",
            params![legacy, entity_id],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Customer".to_string(),
                id: entity_id.to_string(),
            });
        }
        Ok(())
    }
}

// ==========================================
// SqliteAddressRepository
// ==========================================
pub struct SqliteAddressRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAddressRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl AddressRepository for SqliteAddressRepository {
    async fn find_by_natural_key(
        &self,
        parent_id: i64,
        address: &CanonicalAddress,
    ) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        // IS 比较: NULL 字段也按精确相等参与自然键
        let mut stmt = conn.prepare(
            r#"
            SELECT entity_id FROM customer_address_entity
            WHERE parent_id = ?1
              AND firstname IS ?2
              AND lastname IS ?3
              AND street IS ?4
              AND city IS ?5
              AND region IS ?6
              AND postcode IS ?7
              AND country_id IS ?8
            LIMIT 1
            "#,
        )?;

        let entity_id = stmt
            .query_row(
                params![
                    parent_id,
                    address.firstname,
                    address.lastname,
                    address.street,
                    address.city,
                    address.region,
                    address.postcode,
                    address.country_id,
                ],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        Ok(entity_id)
    }

    async fn create(&self, parent_id: i64, address: &CanonicalAddress) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let created_at = address
            .created_at
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        conn.execute(
            r#"
            INSERT INTO customer_address_entity (
                parent_id, firstname, middlename, lastname, company,
                street, city, region, region_id, postcode,
                country_id, telephone, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                parent_id,
                address.firstname,
                address.middlename,
                address.lastname,
                address.company,
                address.street,
                address.city,
                address.region,
                address.region_id,
                address.postcode,
                address.country_id,
                address.telephone,
                created_at,
                address.updated_at,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }
}

// ==========================================
// SqliteCardRepository
// ==========================================
pub struct SqliteCardRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCardRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl CardRepository for SqliteCardRepository {
    async fn find_by_public_hash(
        &self,
        customer_id: i64,
        public_hash: &str,
    ) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let entity_id = conn
            .query_row(
                "SELECT entity_id FROM vault_payment_token WHERE customer_id = ?1 AND public_hash = ?2 LIMIT 1",
                params![customer_id, public_hash],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(entity_id)
    }

    async fn create(&self, card: &CanonicalCard) -> RepositoryResult<i64> {
        let customer_id = card.customer_id.ok_or_else(|| {
            RepositoryError::InternalError("存储卡缺少归属客户 ID".to_string())
        })?;
        let gateway_token = card.gateway_token.as_deref().ok_or_else(|| {
            RepositoryError::InternalError("存储卡缺少网关令牌".to_string())
        })?;
        let public_hash = card.public_hash.as_deref().ok_or_else(|| {
            RepositoryError::InternalError("存储卡缺少公共哈希".to_string())
        })?;

        let details = serde_json::json!({
            "type": card.brand,
            "maskedCC": card.masked_number,
            "expirationDate": card.expiry_mmyy(),
        })
        .to_string();

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO vault_payment_token (
                customer_id, public_hash, payment_method_code, type,
                gateway_token, details, is_active, is_visible,
                expires_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, 1, ?7, ?8)
            "#,
            params![
                customer_id,
                public_hash,
                PAYMENT_METHOD_CODE,
                TOKEN_TYPE_CARD,
                gateway_token,
                details,
                card_expires_at(card),
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }
}

/// 令牌失效时间: 过期月份的次月 1 日
fn card_expires_at(card: &CanonicalCard) -> Option<String> {
    let month = card.expiry_month.as_deref()?.parse::<u32>().ok()?;
    let year = card.expiry_year.as_deref()?.parse::<i32>().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    let (year, month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    Some(format!("{:04}-{:02}-01 00:00:00", year, month))
}
