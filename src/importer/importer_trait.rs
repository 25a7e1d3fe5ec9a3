// ==========================================
// 客户数据导入 - 协作方接口定义
// ==========================================
// 职责: 运行驱动器依赖的外部协作方抽象
// 红线: 核心只产出结构化数据,打印/发信等 I/O 由协作方实现
// ==========================================

use async_trait::async_trait;

use crate::domain::customer::RunSummary;
use crate::importer::error::ImportResult;

/// CSV 数据源接口: 读取全部行（首行为表头）
pub trait CsvSource: Send + Sync {
    /// 读取文件全部行,按文件顺序返回原始单元格
    ///
    /// 单元格不做修剪,保留原始空白。
    fn read_all_rows(&self, file_path: &str) -> ImportResult<Vec<Vec<String>>>;
}

/// 运行汇总上报接口
pub trait Reporter: Send + Sync {
    /// 接收运行汇总（含被拒绝行清单）
    fn report(&self, summary: &RunSummary);
}

/// 欢迎邮件发送接口
///
/// 新建客户后触发; 发送失败不拒绝该行（实体已落库,行级拒绝会
/// 破坏"不留部分实体"的约定）,由驱动器记警告后继续。
#[async_trait]
pub trait WelcomeEmailSender: Send + Sync {
    async fn send_new_account_email(&self, customer_id: i64, email: &str) -> ImportResult<()>;
}
