// ==========================================
// 客户数据导入 - 客户导入集成测试
// ==========================================


use std::sync::Arc;

use async_trait::async_trait;

use customer_import::config::ImportConfig;
use customer_import::domain::customer::{
    CanonicalCustomer, CustomerPatch, CustomerRecord,
};
use customer_import::domain::types::RejectReason;
use customer_import::importer::{
    CsvFileSource, ImportResult, ImportRunner, LogReporter, NoopEmailSender, WelcomeEmailSender,
};
use customer_import::repository::{
    CustomerRepository, RepositoryError, RepositoryResult, SqliteAddressRepository,
    SqliteCardRepository, SqliteCustomerRepository,
};

#[tokio::test]
async fn test_import_customers_creates_new() {
    customer_import::logging::init_test();
    let (_db_file, db_path) = test_helpers::create_test_db();
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(
        "email,firstname,lastname\n\
         Jane.Doe@Example.COM,Jane,Doe\n\
         bob@example.com,Bob,Smith\n",
    );

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.total_rows, 2);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.skipped_existing, 0);
    assert_eq!(summary.rejected, 0);
    assert_eq!(test_helpers::count_rows(&db_path, "customer_entity"), 2);

    // email 落库前转小写
    let email = test_helpers::query_text(
        &db_path,
        "SELECT email FROM customer_entity ORDER BY entity_id LIMIT 1",
    );
    assert_eq!(email.as_deref(), Some("jane.doe@example.com"));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(
        "email,firstname,lastname\n\
         jane@example.com,Jane,Doe\n\
         bob@example.com,Bob,Smith\n",
    );

    let first = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();
    let second = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(first.created, 2);
    assert_eq!(first.skipped_existing, 0);
    // 第二遍零新建,差异只体现在"已存在跳过"桶
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped_existing, 2);
    assert_eq!(second.rejected, 0);
    assert_eq!(test_helpers::count_rows(&db_path, "customer_entity"), 2);
}

#[tokio::test]
async fn test_existing_customer_patched_but_counted_skipped() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    test_helpers::seed_customer(&db_path, "jane@example.com", "");
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(
        "email,firstname,lastname,old_customer_id\n\
         jane@example.com,Jane,Doe,100042\n",
    );

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    // 补丁发生,但计数仍进"已存在跳过"
    assert_eq!(summary.created, 0);
    assert_eq!(summary.skipped_existing, 1);

    let legacy = test_helpers::query_text(
        &db_path,
        "SELECT legacy_customer_id FROM customer_entity WHERE email='jane@example.com'",
    );
    assert_eq!(legacy.as_deref(), Some("100042"));
}

#[tokio::test]
async fn test_patch_disabled_leaves_existing_untouched() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    test_helpers::seed_customer(&db_path, "jane@example.com", "original");
    let config = ImportConfig {
        patch_existing_customers: false,
        ..Default::default()
    };
    let runner = test_helpers::build_runner(&db_path, config);

    let csv = test_helpers::write_csv(
        "email,firstname,lastname,old_customer_id\n\
         jane@example.com,Jane,Doe,100042\n",
    );

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.skipped_existing, 1);
    let legacy = test_helpers::query_text(
        &db_path,
        "SELECT legacy_customer_id FROM customer_entity WHERE email='jane@example.com'",
    );
    assert_eq!(legacy.as_deref(), Some("original"));
}

#[tokio::test]
async fn test_missing_lastname_rejected_verbatim() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(
        "email,firstname,lastname\n\
         jane@example.com,Jane,\n",
    );

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.created, 0);
    assert_eq!(summary.rejected, 1);
    assert_eq!(test_helpers::count_rows(&db_path, "customer_entity"), 0);

    let rejected = &summary.rejected_rows[0];
    assert_eq!(rejected.row_number, 2);
    // 报告原始值（映射前）
    assert_eq!(rejected.raw_cells, vec!["jane@example.com", "Jane", ""]);
    assert_eq!(
        rejected.reason,
        RejectReason::MissingRequiredField {
            field: "lastname".to_string()
        }
    );
}

#[tokio::test]
async fn test_malformed_row_rejected_not_fatal() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(
        "email,firstname,lastname\n\
         jane@example.com,Jane\n\
         bob@example.com,Bob,Smith\n",
    );

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    // 列数不一致是行级错误,后续行继续处理
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(
        summary.rejected_rows[0].reason,
        RejectReason::MalformedRow {
            expected: 3,
            actual: 2
        }
    );
}

#[tokio::test]
async fn test_null_sentinel_treated_as_missing() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(
        "email,firstname,middlename,lastname\n\
         jane@example.com,Jane,NULL,Doe\n",
    );

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    let middlename = test_helpers::query_text(
        &db_path,
        "SELECT middlename FROM customer_entity WHERE email='jane@example.com'",
    );
    assert_eq!(middlename, None);
}

#[tokio::test]
async fn test_wcsid_preserves_entity_id() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(
        "wcsid,email,firstname,lastname\n\
         7001,jane@example.com,Jane,Doe\n",
    );

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    let entity_id = test_helpers::query_text(
        &db_path,
        "SELECT CAST(entity_id AS TEXT) FROM customer_entity WHERE email='jane@example.com'",
    );
    assert_eq!(entity_id.as_deref(), Some("7001"));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    let config = ImportConfig {
        dry_run: true,
        ..Default::default()
    };
    let runner = test_helpers::build_runner(&db_path, config);

    let csv = test_helpers::write_csv(
        "email,firstname,lastname\n\
         jane@example.com,Jane,Doe\n",
    );

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.created, 1);
    assert_eq!(test_helpers::count_rows(&db_path, "customer_entity"), 0);
}

#[tokio::test]
async fn test_cancellation_returns_partial_summary() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(
        "email,firstname,lastname\n\
         jane@example.com,Jane,Doe\n\
         bob@example.com,Bob,Smith\n",
    );

    // 运行前置位: 第一个行边界即停止
    runner
        .cancel_handle()
        .store(true, std::sync::atomic::Ordering::Relaxed);

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.total_rows, 0);
    assert_eq!(test_helpers::count_rows(&db_path, "customer_entity"), 0);
}

#[tokio::test]
async fn test_custom_attributes_persisted_by_allow_list() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    let config = ImportConfig {
        custom_attributes: vec!["loyalty_tier".to_string()],
        ..Default::default()
    };
    let runner = test_helpers::build_runner(&db_path, config);

    let csv = test_helpers::write_csv(
        "email,firstname,lastname,loyalty_tier,nickname\n\
         jane@example.com,Jane,Doe,gold,JJ\n",
    );

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    let tier = test_helpers::query_text(
        &db_path,
        "SELECT value FROM customer_entity_attribute WHERE attribute_code='loyalty_tier'",
    );
    assert_eq!(tier.as_deref(), Some("gold"));
    // 清单外的 nickname 列不落库
    assert_eq!(
        test_helpers::count_rows(&db_path, "customer_entity_attribute"),
        1
    );
}

// ==========================================
// 欢迎邮件触发
// ==========================================

/// 记录每次发送调用的邮件发送器
struct RecordingEmailSender {
    sent: Arc<std::sync::Mutex<Vec<(i64, String)>>>,
}

#[async_trait]
impl WelcomeEmailSender for RecordingEmailSender {
    async fn send_new_account_email(&self, customer_id: i64, email: &str) -> ImportResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((customer_id, email.to_string()));
        Ok(())
    }
}

fn build_runner_with_sender(
    db_path: &str,
    config: ImportConfig,
    sender: Box<dyn WelcomeEmailSender>,
) -> ImportRunner {
    let shared = Arc::new(std::sync::Mutex::new(
        customer_import::db::open_sqlite_connection(db_path).unwrap(),
    ));
    ImportRunner::new(
        config,
        test_helpers::seed_directory(),
        Box::new(CsvFileSource),
        Arc::new(SqliteCustomerRepository::from_connection(Arc::clone(&shared))),
        Arc::new(SqliteAddressRepository::from_connection(Arc::clone(&shared))),
        Arc::new(SqliteCardRepository::from_connection(shared)),
        Box::new(LogReporter),
        sender,
    )
}

#[tokio::test]
async fn test_welcome_email_sent_once_per_created_customer() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    // 已存在的客户不触发邮件
    test_helpers::seed_customer(&db_path, "jane@example.com", "100042");

    let sent = Arc::new(std::sync::Mutex::new(Vec::new()));
    let config = ImportConfig {
        send_welcome_email: true,
        ..Default::default()
    };
    let runner = build_runner_with_sender(
        &db_path,
        config,
        Box::new(RecordingEmailSender {
            sent: Arc::clone(&sent),
        }),
    );

    let csv = test_helpers::write_csv(
        "email,firstname,lastname\n\
         jane@example.com,Jane,Doe\n\
         bob@example.com,Bob,Smith\n",
    );

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.skipped_existing, 1);

    // 仅新建的 bob 触发一次
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, "bob@example.com");
}

#[tokio::test]
async fn test_welcome_email_suppressed_by_dry_run() {
    let (_db_file, db_path) = test_helpers::create_test_db();

    let sent = Arc::new(std::sync::Mutex::new(Vec::new()));
    let config = ImportConfig {
        send_welcome_email: true,
        dry_run: true,
        ..Default::default()
    };
    let runner = build_runner_with_sender(
        &db_path,
        config,
        Box::new(RecordingEmailSender {
            sent: Arc::clone(&sent),
        }),
    );

    let csv = test_helpers::write_csv(
        "email,firstname,lastname\n\
         jane@example.com,Jane,Doe\n",
    );

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    // 干跑: 计数照常,无写入也无邮件
    assert_eq!(summary.created, 1);
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_welcome_email_off_by_default() {
    let (_db_file, db_path) = test_helpers::create_test_db();

    let sent = Arc::new(std::sync::Mutex::new(Vec::new()));
    let runner = build_runner_with_sender(
        &db_path,
        ImportConfig::default(),
        Box::new(RecordingEmailSender {
            sent: Arc::clone(&sent),
        }),
    );

    let csv = test_helpers::write_csv(
        "email,firstname,lastname\n\
         jane@example.com,Jane,Doe\n",
    );

    let summary = runner
        .import_customers(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    assert!(sent.lock().unwrap().is_empty());
}

// ==========================================
// 致命错误传播
// ==========================================

/// 查找即报存储不可达的客户仓储
struct LostConnectionRepo;

#[async_trait]
impl CustomerRepository for LostConnectionRepo {
    async fn find_by_attributes(
        &self,
        _attributes: &[String],
        _values: &[String],
        _website_id: i64,
    ) -> RepositoryResult<Option<CustomerRecord>> {
        Err(RepositoryError::ConnectionLost("数据库文件丢失".to_string()))
    }

    async fn create(&self, _customer: &CanonicalCustomer) -> RepositoryResult<i64> {
        Err(RepositoryError::ConnectionLost("数据库文件丢失".to_string()))
    }

    async fn update(&self, _entity_id: i64, _patch: &CustomerPatch) -> RepositoryResult<()> {
        Err(RepositoryError::ConnectionLost("数据库文件丢失".to_string()))
    }
}

#[tokio::test]
async fn test_connection_lost_aborts_run() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    let shared = Arc::new(std::sync::Mutex::new(
        customer_import::db::open_sqlite_connection(&db_path).unwrap(),
    ));
    let runner = ImportRunner::new(
        ImportConfig::default(),
        test_helpers::seed_directory(),
        Box::new(CsvFileSource),
        Arc::new(LostConnectionRepo),
        Arc::new(SqliteAddressRepository::from_connection(Arc::clone(&shared))),
        Arc::new(SqliteCardRepository::from_connection(shared)),
        Box::new(LogReporter),
        Box::new(NoopEmailSender),
    );

    let csv = test_helpers::write_csv(
        "email,firstname,lastname\n\
         jane@example.com,Jane,Doe\n",
    );

    let result = runner.import_customers(&test_helpers::csv_path(&csv)).await;
    let err = result.unwrap_err();
    assert!(err.is_fatal());
}
