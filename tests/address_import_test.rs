// ==========================================
// 客户数据导入 - 地址导入集成测试
// ==========================================


use customer_import::config::ImportConfig;
use customer_import::domain::types::RejectReason;

const ADDRESS_HEADER: &str = "customer_id,firstname,lastname,address1,address2,city,state,zip,country,phone";

#[tokio::test]
async fn test_import_addresses_creates_with_normalization() {
    customer_import::logging::init_test();
    let (_db_file, db_path) = test_helpers::create_test_db();
    test_helpers::seed_customer(&db_path, "jane@example.com", "100042");
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(&format!(
        "{}\n100042,jane,doe,12 oak st,,san jose,CA,1234,United States,\n",
        ADDRESS_HEADER
    ));

    let summary = runner
        .import_addresses(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.rejected, 0);
    assert_eq!(summary.orphan_skipped, 0);

    // 规范化: 首字母大写 / 地区代码解析 / 邮编补零 / 电话哨兵
    let street = test_helpers::query_text(
        &db_path,
        "SELECT street FROM customer_address_entity LIMIT 1",
    );
    assert_eq!(street.as_deref(), Some("12 Oak St"));

    let region = test_helpers::query_text(
        &db_path,
        "SELECT region FROM customer_address_entity LIMIT 1",
    );
    assert_eq!(region.as_deref(), Some("California"));

    let region_id = test_helpers::query_text(
        &db_path,
        "SELECT CAST(region_id AS TEXT) FROM customer_address_entity LIMIT 1",
    );
    assert_eq!(region_id.as_deref(), Some("12"));

    let postcode = test_helpers::query_text(
        &db_path,
        "SELECT postcode FROM customer_address_entity LIMIT 1",
    );
    assert_eq!(postcode.as_deref(), Some("01234"));

    let telephone = test_helpers::query_text(
        &db_path,
        "SELECT telephone FROM customer_address_entity LIMIT 1",
    );
    assert_eq!(telephone.as_deref(), Some("000-000-0000"));
}

#[tokio::test]
async fn test_region_resolved_by_name() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    test_helpers::seed_customer(&db_path, "jane@example.com", "100042");
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(&format!(
        "{}\n100042,jane,doe,12 oak st,,albany,new york,12207,United States,555-0100\n",
        ADDRESS_HEADER
    ));

    let summary = runner
        .import_addresses(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    let region_id = test_helpers::query_text(
        &db_path,
        "SELECT CAST(region_id AS TEXT) FROM customer_address_entity LIMIT 1",
    );
    assert_eq!(region_id.as_deref(), Some("43"));
}

#[tokio::test]
async fn test_rerun_skips_exact_duplicate() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    test_helpers::seed_customer(&db_path, "jane@example.com", "100042");
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(&format!(
        "{}\n100042,jane,doe,12 oak st,,san jose,CA,95101,United States,555-0100\n",
        ADDRESS_HEADER
    ));

    let first = runner
        .import_addresses(&test_helpers::csv_path(&csv))
        .await
        .unwrap();
    let second = runner
        .import_addresses(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(first.created, 1);
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped_existing, 1);
    assert_eq!(
        test_helpers::count_rows(&db_path, "customer_address_entity"),
        1
    );
}

#[tokio::test]
async fn test_any_field_difference_creates_new_address() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    test_helpers::seed_customer(&db_path, "jane@example.com", "100042");
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(&format!(
        "{}\n100042,jane,doe,12 oak st,,san jose,CA,95101,United States,555-0100\n",
        ADDRESS_HEADER
    ));
    runner
        .import_addresses(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    // 仅邮编不同: 视为新地址,无模糊匹配
    let csv = test_helpers::write_csv(&format!(
        "{}\n100042,jane,doe,12 oak st,,san jose,CA,95102,United States,555-0100\n",
        ADDRESS_HEADER
    ));
    let summary = runner
        .import_addresses(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(
        test_helpers::count_rows(&db_path, "customer_address_entity"),
        2
    );
}

#[tokio::test]
async fn test_orphan_rows_silently_skipped() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(&format!(
        "{}\n999999,jane,doe,12 oak st,,san jose,CA,95101,United States,555-0100\n",
        ADDRESS_HEADER
    ));

    let summary = runner
        .import_addresses(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    // 孤儿行静默跳过,不计错误
    assert_eq!(summary.orphan_skipped, 1);
    assert_eq!(summary.created, 0);
    assert_eq!(summary.rejected, 0);
}

#[tokio::test]
async fn test_missing_postcode_rejected_verbatim() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    test_helpers::seed_customer(&db_path, "jane@example.com", "100042");
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(&format!(
        "{}\n100042,jane,doe,12 oak st,,san jose,CA,,United States,555-0100\n",
        ADDRESS_HEADER
    ));

    let summary = runner
        .import_addresses(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.created, 0);
    assert_eq!(summary.skipped_existing, 0);

    let rejected = &summary.rejected_rows[0];
    assert_eq!(
        rejected.reason,
        RejectReason::MissingRequiredField {
            field: "postcode".to_string()
        }
    );
    // 原始单元格保持映射前的小写值
    assert!(rejected.raw_cells.contains(&"jane".to_string()));
    assert!(rejected.raw_cells.contains(&"san jose".to_string()));
}

#[tokio::test]
async fn test_unresolvable_region_rejected() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    test_helpers::seed_customer(&db_path, "jane@example.com", "100042");
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(&format!(
        "{}\n100042,jane,doe,12 oak st,,san jose,--,95101,United States,555-0100\n",
        ADDRESS_HEADER
    ));

    let summary = runner
        .import_addresses(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.rejected, 1);
    assert!(matches!(
        summary.rejected_rows[0].reason,
        RejectReason::Validation { ref field, .. } if field == "region"
    ));
}

#[tokio::test]
async fn test_non_us_region_and_postcode_passthrough() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    test_helpers::seed_customer(&db_path, "jane@example.com", "100042");
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let csv = test_helpers::write_csv(&format!(
        "{}\n100042,jane,doe,12 maple ave,,vancouver,british columbia,V6B,Canada,555-0100\n",
        ADDRESS_HEADER
    ));

    let summary = runner
        .import_addresses(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.created, 1);

    let region = test_helpers::query_text(
        &db_path,
        "SELECT region FROM customer_address_entity LIMIT 1",
    );
    assert_eq!(region.as_deref(), Some("British Columbia"));

    let region_id = test_helpers::query_text(
        &db_path,
        "SELECT CAST(region_id AS TEXT) FROM customer_address_entity LIMIT 1",
    );
    assert_eq!(region_id, None);

    // 非美国行邮编不补零
    let postcode = test_helpers::query_text(
        &db_path,
        "SELECT postcode FROM customer_address_entity LIMIT 1",
    );
    assert_eq!(postcode.as_deref(), Some("V6B"));
}

#[tokio::test]
async fn test_street_assembly_keeps_two_physical_lines() {
    let (_db_file, db_path) = test_helpers::create_test_db();
    test_helpers::seed_customer(&db_path, "jane@example.com", "100042");
    let runner = test_helpers::build_runner(&db_path, ImportConfig::default());

    let header = "customer_id,firstname,lastname,address1,address2,address3,suite,city,state,zip,country,phone";
    let csv = test_helpers::write_csv(&format!(
        "{}\n100042,jane,doe,12 oak st,bldg 4,floor 2,suite 9,san jose,CA,95101,United States,555-0100\n",
        header
    ));

    let summary = runner
        .import_addresses(&test_helpers::csv_path(&csv))
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    let street = test_helpers::query_text(
        &db_path,
        "SELECT street FROM customer_address_entity LIMIT 1",
    );
    assert_eq!(street.as_deref(), Some("12 Oak St\nBldg 4 Floor 2 Suite 9"));
}
