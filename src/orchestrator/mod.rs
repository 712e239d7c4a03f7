//! 编排层
//!
//! `bootstrap` 负责进入考试前的有效性闸门，
//! `SessionRunner` 负责会话期间的事件中枢，
//! `App` 把两者和各资源（HTTP 客户端、实时通道、计时器）接在一起

pub mod bootstrap;
pub mod session_runner;

pub use bootstrap::{bootstrap, validate_identity, BootstrapOutcome};
pub use session_runner::{HostEvent, SessionRunner};

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::clients::ExamClient;
use crate::config::Config;
use crate::infrastructure::RealtimeChannel;
use crate::models::ExamDefinition;
use crate::services::{TimerEngine, VisibilityMonitor};
use crate::utils::logging;
use crate::workflow::{
    RouteTarget, SessionCell, SessionCtx, SessionNotice, SessionState, SubmitFlow,
};

/// 应用主结构
pub struct App {
    config: Config,
    ctx: Arc<SessionCtx>,
    client: ExamClient,
    exam: Arc<ExamDefinition>,
    attempt_id: String,
}

impl App {
    /// 初始化应用：日志、引导闸门
    ///
    /// 引导失败（身份缺失 / 场次已提交 / 数据异常）时返回错误，
    /// 此时通道和计时器都未启动，调用方提示后直接退出
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config);

        let ctx = Arc::new(SessionCtx::from_config(&config));
        let client = ExamClient::new(&config);

        let outcome = bootstrap::bootstrap(&client, &ctx).await?;

        Ok(Self {
            config,
            ctx,
            client,
            exam: outcome.exam,
            attempt_id: outcome.attempt_id,
        })
    }

    /// 运行考试会话
    ///
    /// # 参数
    /// - `host_rx`: 宿主事件接收端（命令行驱动程序或嵌入方提供）
    ///
    /// # 返回
    /// 返回交卷后的去向
    pub async fn run(self, host_rx: mpsc::UnboundedReceiver<HostEvent>) -> Result<RouteTarget> {
        let (channel, signals_rx) =
            RealtimeChannel::connect(&self.config.realtime_url, self.ctx.clone()).await?;
        let channel_handle = channel.handle();

        let session = SessionCell::new(SessionState::new(&self.exam));
        let (triggers_tx, triggers_rx) = mpsc::unbounded_channel();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();

        logging::log_session_start(&self.exam, &self.ctx);

        // 提示消费者：把会话提示转成终端输出
        let printer = tokio::spawn(print_notices(notices_rx));

        let timer_task = TimerEngine::new(session.clone(), triggers_tx.clone()).spawn();

        let monitor = VisibilityMonitor::new(
            session.clone(),
            channel_handle.clone(),
            self.exam.max_tab_switch,
            triggers_tx,
            notices_tx.clone(),
        );

        let flow = SubmitFlow::new(
            session.clone(),
            self.exam.clone(),
            self.attempt_id.clone(),
            self.client,
            channel_handle.clone(),
            notices_tx.clone(),
        );

        let runner = SessionRunner::new(
            session,
            self.exam.clone(),
            channel_handle,
            flow,
            monitor,
            triggers_rx,
            notices_tx,
        );

        let route = runner.run(host_rx, signals_rx, timer_task, channel).await?;

        printer.abort();
        logging::log_route(route);

        Ok(route)
    }
}

/// 把会话提示打到终端
async fn print_notices(mut notices_rx: mpsc::UnboundedReceiver<SessionNotice>) {
    while let Some(notice) = notices_rx.recv().await {
        match notice {
            SessionNotice::TabSwitchWarning { count, max } => {
                warn!("⚠️ 已切屏 {}/{} 次，达到上限将自动交卷", count, max);
            }
            SessionNotice::ConfirmSubmit {
                answered,
                total,
                time_left_seconds,
                tab_switches,
            } => {
                info!(
                    "📋 确认交卷？已答 {}/{} 题 | 剩余 {} 秒 | 切屏 {} 次 （输入 yes 确认，no 取消）",
                    answered, total, time_left_seconds, tab_switches
                );
            }
            SessionNotice::ChannelWarning(message) => {
                warn!("⚠️ 实时通道: {}", message);
            }
            SessionNotice::SubmitFailed(message) => {
                warn!("❌ 交卷失败（不会自动重试）: {}", message);
            }
        }
    }
}
