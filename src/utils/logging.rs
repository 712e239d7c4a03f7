//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use std::fs;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::ExamDefinition;
use crate::workflow::{RouteTarget, SessionCtx};

/// 初始化日志订阅器
///
/// 级别从 RUST_LOG 读取，未设置时默认 info
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
///
/// # 返回
/// 返回是否成功初始化
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n考试会话日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 考试会话控制器");
    info!("📡 API 地址: {}", config.exam_api_base_url);
    info!("🔌 通道地址: {}", config.realtime_url);
    info!("{}", "=".repeat(60));
}

/// 记录会话开始信息
///
/// # 参数
/// - `exam`: 试卷定义
/// - `ctx`: 会话上下文
pub fn log_session_start(exam: &ExamDefinition, ctx: &SessionCtx) {
    info!("\n{}", "=".repeat(60));
    info!("📝 会话开始 {}", ctx);
    info!(
        "📄 {} | {} 道题 | 时长 {} 分钟 | 切屏上限 {} 次",
        exam.title,
        exam.question_count(),
        exam.duration_minutes,
        exam.max_tab_switch
    );
    if exam.test_type.is_pre_opened() {
        info!("💡 练习模式，无需等待开考");
    } else {
        info!("⏳ 等待教师端开考...");
    }
    info!("{}", "=".repeat(60));
}

/// 记录会话去向
pub fn log_route(route: RouteTarget) {
    match route {
        RouteTarget::Results => info!("➡️ 前往成绩页"),
        RouteTarget::ExamList => info!("➡️ 返回考试列表"),
    }
}
