// ==========================================
// 客户数据导入 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化导入目标表结构
///
/// 自然键约束:
/// - customer_entity: (email, website_id) 唯一
/// - customer_address_entity 与 vault_payment_token 不加唯一约束,
///   去重由仓储查找完成（地址全字段精确相等; 存储卡按策略,
///   AlwaysCreate 模式允许同哈希重复落库）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS customer_entity (
            entity_id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            firstname TEXT,
            middlename TEXT,
            lastname TEXT,
            website_id INTEGER NOT NULL,
            store_id INTEGER NOT NULL,
            group_id TEXT,
            legacy_customer_id TEXT,
            password_hash TEXT,
            created_at TEXT,
            UNIQUE(email, website_id)
        );

        CREATE TABLE IF NOT EXISTS customer_entity_attribute (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_id INTEGER NOT NULL,
            attribute_code TEXT NOT NULL,
            value TEXT,
            FOREIGN KEY (entity_id) REFERENCES customer_entity(entity_id),
            UNIQUE(entity_id, attribute_code)
        );

        CREATE TABLE IF NOT EXISTS customer_address_entity (
            entity_id INTEGER PRIMARY KEY AUTOINCREMENT,
            parent_id INTEGER NOT NULL,
            firstname TEXT,
            middlename TEXT,
            lastname TEXT,
            company TEXT,
            street TEXT,
            city TEXT,
            region TEXT,
            region_id INTEGER,
            postcode TEXT,
            country_id TEXT,
            telephone TEXT,
            created_at TEXT,
            updated_at TEXT,
            FOREIGN KEY (parent_id) REFERENCES customer_entity(entity_id)
        );

        CREATE TABLE IF NOT EXISTS vault_payment_token (
            entity_id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL,
            public_hash TEXT NOT NULL,
            payment_method_code TEXT NOT NULL,
            type TEXT NOT NULL,
            gateway_token TEXT NOT NULL,
            details TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_visible INTEGER NOT NULL DEFAULT 1,
            expires_at TEXT,
            created_at TEXT,
            FOREIGN KEY (customer_id) REFERENCES customer_entity(entity_id)
        );
        "#,
    )?;
    Ok(())
}
