// ==========================================
// 客户数据导入 - 运行汇总上报实现
// ==========================================
// 职责: 把结构化汇总写入日志（核心自身不做 I/O）
// ==========================================

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::customer::RunSummary;
use crate::importer::error::ImportResult;
use crate::importer::importer_trait::{Reporter, WelcomeEmailSender};

/// 日志上报器: 汇总计数走 info,逐条被拒绝行走 warn
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, summary: &RunSummary) {
        info!(
            entity_kind = %summary.entity_kind,
            total_rows = summary.total_rows,
            created = summary.created,
            skipped_existing = summary.skipped_existing,
            rejected = summary.rejected,
            orphan_skipped = summary.orphan_skipped,
            elapsed_ms = summary.elapsed_ms as u64,
            dry_run = summary.dry_run,
            cancelled = summary.cancelled,
            "导入运行汇总"
        );

        for rejected in &summary.rejected_rows {
            warn!(
                row_number = rejected.row_number,
                reason = %rejected.reason,
                raw = ?rejected.raw_cells,
                "被拒绝行"
            );
        }
    }
}

/// 空实现: 不发送欢迎邮件（send_welcome_email 关闭时使用）
pub struct NoopEmailSender;

#[async_trait]
impl WelcomeEmailSender for NoopEmailSender {
    async fn send_new_account_email(&self, _customer_id: i64, _email: &str) -> ImportResult<()> {
        Ok(())
    }
}
