// ==========================================
// 客户数据导入 - 导入运行驱动器实现
// ==========================================
// 职责: 读文件 → 提取表头 → 逐行 映射/判定/写入 → 汇总上报
// 红线: 行严格按文件顺序处理; 仅存储不可达类错误中止运行;
//       每行之间设协作式取消点; 干跑模式不触达任何写入
// ==========================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::config::ImportConfig;
use crate::domain::customer::{CustomerPatch, RawRow, RunSummary};
use crate::domain::types::{EntityKind, ImportOutcome, ReconcileDecision, RejectReason};
use crate::importer::directory::DirectoryResolver;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{CsvSource, Reporter, WelcomeEmailSender};
use crate::importer::reconciler::Reconciler;
use crate::importer::row_mapper::RowMapper;
use crate::repository::customer_repo::{AddressRepository, CardRepository, CustomerRepository};

pub struct ImportRunner {
    config: ImportConfig,
    mapper: RowMapper,
    reconciler: Reconciler,
    csv_source: Box<dyn CsvSource>,
    customer_repo: Arc<dyn CustomerRepository>,
    address_repo: Arc<dyn AddressRepository>,
    card_repo: Arc<dyn CardRepository>,
    reporter: Box<dyn Reporter>,
    email_sender: Box<dyn WelcomeEmailSender>,
    cancel_flag: Arc<AtomicBool>,
}

impl ImportRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ImportConfig,
        directory: Arc<DirectoryResolver>,
        csv_source: Box<dyn CsvSource>,
        customer_repo: Arc<dyn CustomerRepository>,
        address_repo: Arc<dyn AddressRepository>,
        card_repo: Arc<dyn CardRepository>,
        reporter: Box<dyn Reporter>,
        email_sender: Box<dyn WelcomeEmailSender>,
    ) -> Self {
        Self {
            mapper: RowMapper::new(config.clone(), directory),
            reconciler: Reconciler::new(config.clone()),
            config,
            csv_source,
            customer_repo,
            address_repo,
            card_repo,
            reporter,
            email_sender,
            cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 取消句柄: 置位后,运行在下一行边界停止并返回部分汇总
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_flag)
    }

    // ==========================================
    // 客户导入
    // ==========================================

    #[instrument(skip(self))]
    pub async fn import_customers(&self, file_path: &str) -> ImportResult<RunSummary> {
        let start = Instant::now();
        info!(file_path = file_path, dry_run = self.config.dry_run, "开始客户导入");

        let (header, data_rows) = self.load_rows(file_path)?;
        let mut summary = RunSummary::new(EntityKind::Customer, self.config.dry_run);

        for (index, cells) in data_rows.into_iter().enumerate() {
            if self.cancelled(&mut summary) {
                break;
            }
            // 表头占第 1 行,数据从第 2 行起
            let row_number = index + 2;
            summary.total_rows += 1;

            let raw_row = match zip_row(&header, &cells, row_number) {
                Ok(row) => row,
                Err(e) => {
                    let reason = row_reject_reason(e)?;
                    summary.push_rejected(row_number, cells, reason);
                    continue;
                }
            };

            let outcome = self.customer_row_outcome(&raw_row).await?;
            summary.record(&raw_row, outcome);
        }

        summary.elapsed_ms = start.elapsed().as_millis();
        self.reporter.report(&summary);
        Ok(summary)
    }

    /// 单行客户处理: 映射 → 判定 → 写入
    ///
    /// 返回 Err 仅表示致命错误; 行级失败全部折叠为 Rejected 结果
    async fn customer_row_outcome(&self, raw_row: &RawRow) -> ImportResult<ImportOutcome> {
        let customer = match self.mapper.map_customer(raw_row) {
            Ok(c) => c,
            Err(e) => return Ok(ImportOutcome::Rejected(row_reject_reason(e)?)),
        };

        let decision = match self
            .reconciler
            .decide_customer(&customer, self.customer_repo.as_ref())
            .await
        {
            Ok(d) => d,
            Err(e) => return Ok(ImportOutcome::Rejected(row_reject_reason(e)?)),
        };

        match decision {
            ReconcileDecision::Reject(reason) => Ok(ImportOutcome::Rejected(reason)),
            ReconcileDecision::SkipExisting { existing_id } => {
                Ok(ImportOutcome::SkippedExisting(existing_id))
            }
            ReconcileDecision::PatchExisting {
                existing_id,
                legacy_customer_id,
            } => {
                if !self.config.dry_run {
                    let patch = CustomerPatch { legacy_customer_id };
                    if let Err(e) = self.customer_repo.update(existing_id, &patch).await {
                        let reason = row_reject_reason(ImportError::Repository(e))?;
                        return Ok(ImportOutcome::Rejected(reason));
                    }
                }
                // 补丁路径仍计入"已存在跳过"（历史行为）
                Ok(ImportOutcome::SkippedExisting(existing_id))
            }
            ReconcileDecision::Create => {
                if self.config.dry_run {
                    return Ok(ImportOutcome::Created(0));
                }
                match self.customer_repo.create(&customer).await {
                    Ok(entity_id) => {
                        self.maybe_send_welcome_email(entity_id, &customer.email).await;
                        Ok(ImportOutcome::Created(entity_id))
                    }
                    Err(e) => {
                        let reason = row_reject_reason(ImportError::Repository(e))?;
                        Ok(ImportOutcome::Rejected(reason))
                    }
                }
            }
        }
    }

    /// 新建客户后触发欢迎邮件
    ///
    /// 实体已落库,发送失败不拒绝该行,记警告后继续
    async fn maybe_send_welcome_email(&self, customer_id: i64, email: &Option<String>) {
        if !self.config.send_welcome_email {
            return;
        }
        let email = match email.as_deref() {
            Some(e) => e,
            None => return,
        };
        if let Err(e) = self
            .email_sender
            .send_new_account_email(customer_id, email)
            .await
        {
            warn!(customer_id, email = email, error = %e, "欢迎邮件发送失败");
        }
    }

    // ==========================================
    // 地址导入
    // ==========================================

    #[instrument(skip(self))]
    pub async fn import_addresses(&self, file_path: &str) -> ImportResult<RunSummary> {
        let start = Instant::now();
        info!(file_path = file_path, dry_run = self.config.dry_run, "开始地址导入");

        let (header, data_rows) = self.load_rows(file_path)?;
        let mut summary = RunSummary::new(EntityKind::Address, self.config.dry_run);

        for (index, cells) in data_rows.into_iter().enumerate() {
            if self.cancelled(&mut summary) {
                break;
            }
            let row_number = index + 2;
            summary.total_rows += 1;

            let raw_row = match zip_row(&header, &cells, row_number) {
                Ok(row) => row,
                Err(e) => {
                    let reason = row_reject_reason(e)?;
                    summary.push_rejected(row_number, cells, reason);
                    continue;
                }
            };

            match self.address_row_outcome(&raw_row).await? {
                Some(outcome) => summary.record(&raw_row, outcome),
                // 归属客户未命中: 孤儿行静默跳过,不计错误
                None => summary.orphan_skipped += 1,
            }
        }

        summary.elapsed_ms = start.elapsed().as_millis();
        self.reporter.report(&summary);
        Ok(summary)
    }

    async fn address_row_outcome(&self, raw_row: &RawRow) -> ImportResult<Option<ImportOutcome>> {
        let parent_id = match self.resolve_parent_customer(raw_row).await {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(None),
            Err(e) => return Ok(Some(ImportOutcome::Rejected(row_reject_reason(e)?))),
        };

        let address = match self.mapper.map_address(raw_row) {
            Ok(a) => a,
            Err(e) => return Ok(Some(ImportOutcome::Rejected(row_reject_reason(e)?))),
        };

        let decision = match self
            .reconciler
            .decide_address(parent_id, &address, self.address_repo.as_ref())
            .await
        {
            Ok(d) => d,
            Err(e) => return Ok(Some(ImportOutcome::Rejected(row_reject_reason(e)?))),
        };

        let outcome = match decision {
            ReconcileDecision::Reject(reason) => ImportOutcome::Rejected(reason),
            ReconcileDecision::SkipExisting { existing_id }
            | ReconcileDecision::PatchExisting { existing_id, .. } => {
                ImportOutcome::SkippedExisting(existing_id)
            }
            ReconcileDecision::Create => {
                if self.config.dry_run {
                    ImportOutcome::Created(0)
                } else {
                    match self.address_repo.create(parent_id, &address).await {
                        Ok(entity_id) => ImportOutcome::Created(entity_id),
                        Err(e) => {
                            ImportOutcome::Rejected(row_reject_reason(ImportError::Repository(e))?)
                        }
                    }
                }
            }
        };
        Ok(Some(outcome))
    }

    // ==========================================
    // 存储卡导入
    // ==========================================

    #[instrument(skip(self))]
    pub async fn import_cards(&self, file_path: &str) -> ImportResult<RunSummary> {
        let start = Instant::now();
        info!(file_path = file_path, dry_run = self.config.dry_run, "开始存储卡导入");

        let (header, data_rows) = self.load_rows(file_path)?;
        let mut summary = RunSummary::new(EntityKind::Card, self.config.dry_run);

        for (index, cells) in data_rows.into_iter().enumerate() {
            if self.cancelled(&mut summary) {
                break;
            }
            let row_number = index + 2;
            summary.total_rows += 1;

            let raw_row = match zip_row(&header, &cells, row_number) {
                Ok(row) => row,
                Err(e) => {
                    let reason = row_reject_reason(e)?;
                    summary.push_rejected(row_number, cells, reason);
                    continue;
                }
            };

            match self.card_row_outcome(&raw_row).await? {
                Some(outcome) => summary.record(&raw_row, outcome),
                None => summary.orphan_skipped += 1,
            }
        }

        summary.elapsed_ms = start.elapsed().as_millis();
        self.reporter.report(&summary);
        Ok(summary)
    }

    async fn card_row_outcome(&self, raw_row: &RawRow) -> ImportResult<Option<ImportOutcome>> {
        let parent_id = match self.resolve_parent_customer(raw_row).await {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(None),
            Err(e) => return Ok(Some(ImportOutcome::Rejected(row_reject_reason(e)?))),
        };

        let mut card = match self.mapper.map_card(raw_row) {
            Ok(c) => c,
            Err(e) => return Ok(Some(ImportOutcome::Rejected(row_reject_reason(e)?))),
        };
        card.customer_id = Some(parent_id);

        let decision = match self
            .reconciler
            .decide_card(parent_id, &card, self.card_repo.as_ref())
            .await
        {
            Ok(d) => d,
            Err(e) => return Ok(Some(ImportOutcome::Rejected(row_reject_reason(e)?))),
        };

        let outcome = match decision {
            ReconcileDecision::Reject(reason) => ImportOutcome::Rejected(reason),
            ReconcileDecision::SkipExisting { existing_id }
            | ReconcileDecision::PatchExisting { existing_id, .. } => {
                ImportOutcome::SkippedExisting(existing_id)
            }
            ReconcileDecision::Create => {
                if self.config.dry_run {
                    ImportOutcome::Created(0)
                } else {
                    match self.card_repo.create(&card).await {
                        Ok(entity_id) => ImportOutcome::Created(entity_id),
                        Err(e) => {
                            ImportOutcome::Rejected(row_reject_reason(ImportError::Repository(e))?)
                        }
                    }
                }
            }
        };
        Ok(Some(outcome))
    }

    // ==========================================
    // 共享步骤
    // ==========================================

    /// 读取文件并切出表头
    fn load_rows(&self, file_path: &str) -> ImportResult<(Vec<String>, Vec<Vec<String>>)> {
        let mut rows = self.csv_source.read_all_rows(file_path)?;
        if rows.is_empty() {
            return Err(ImportError::CsvParseError(format!(
                "文件为空,缺少表头行: {}",
                file_path
            )));
        }
        let header = rows.remove(0);
        Ok((header, rows))
    }

    /// 行边界取消点
    fn cancelled(&self, summary: &mut RunSummary) -> bool {
        if self.cancel_flag.load(Ordering::Relaxed) {
            warn!(entity_kind = %summary.entity_kind, "导入运行被取消,返回部分汇总");
            summary.cancelled = true;
            return true;
        }
        false
    }

    /// 按配置属性查找地址/卡行的归属客户
    ///
    /// 标识列的值按逗号分段,与 find_customer_by 属性一一对应;
    /// 标识缺失或段数不符按孤儿行处理
    async fn resolve_parent_customer(&self, raw_row: &RawRow) -> ImportResult<Option<i64>> {
        let raw_id = match raw_row.get_non_null(&self.config.customer_id_column) {
            Some(v) => v,
            None => return Ok(None),
        };

        let values: Vec<String> = raw_id.split(',').map(|s| s.to_string()).collect();
        if values.len() != self.config.find_customer_by.len() {
            warn!(
                row_number = raw_row.row_number,
                raw_id = raw_id,
                "归属标识段数与查找属性数不符,按孤儿行跳过"
            );
            return Ok(None);
        }

        let record = self
            .customer_repo
            .find_by_attributes(&self.config.find_customer_by, &values, self.config.website_id)
            .await?;
        Ok(record.map(|r| r.entity_id))
    }
}

/// 表头与数据行按列位置拉链; 列数不一致构成行级错误
fn zip_row(header: &[String], cells: &[String], row_number: usize) -> ImportResult<RawRow> {
    if cells.len() != header.len() {
        return Err(ImportError::MalformedRow {
            row: row_number,
            expected: header.len(),
            actual: cells.len(),
        });
    }
    let columns = header.iter().cloned().zip(cells.iter().cloned()).collect();
    Ok(RawRow::new(columns, row_number))
}

/// 行级错误 → 拒绝原因; 致命错误原样上抛
fn row_reject_reason(error: ImportError) -> ImportResult<RejectReason> {
    if error.is_fatal() {
        return Err(error);
    }
    match error {
        ImportError::Validation { field, message, .. } => {
            Ok(RejectReason::Validation { field, message })
        }
        ImportError::MalformedRow {
            expected, actual, ..
        } => Ok(RejectReason::MalformedRow { expected, actual }),
        other => Ok(RejectReason::Persistence {
            message: other.to_string(),
        }),
    }
}
