//! 会话运行器 - 编排层
//!
//! ## 职责
//!
//! 本模块是一次考试会话的事件中枢，所有异步事件源在这里汇成
//! 单一的处理循环：
//!
//! 1. **终止信号**：倒计时归零 / 切屏超限 / 手动确认
//! 2. **宿主事件**：作答、标记、跳题、交卷请求、可见性变化
//! 3. **通道信号**：开考、暂停、进房确认、传输状况
//!
//! ## 设计特点
//!
//! - **单循环串行**：信号逐个处理，终止信号之间靠提交锁存裁决，
//!   恰好一个胜出，其余空转
//! - **向下委托**：作答归一化与提交交给 SubmitFlow，
//!   切屏判定交给 VisibilityMonitor
//! - **有序拆除**：停表 → 监视器失效 → leaveExam → 断开连接

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::infrastructure::{ChannelHandle, ChannelSignal, InboundEvent, OutboundEvent,
    PresenceStatus, RealtimeChannel};
use crate::models::{AnswerValue, ExamDefinition};
use crate::services::{VisibilityMonitor, VisibilitySignal};
use crate::utils::text::{strip_html, truncate_text};
use crate::workflow::{
    RouteTarget, SessionCell, SessionNotice, SubmissionApi, SubmitFlow, SubmitReason,
};

/// 宿主事件（界面外壳上报）
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// 记录一道题的作答
    Answer {
        question_id: String,
        value: AnswerValue,
    },
    /// 切换题目标记
    ToggleFlag(String),
    /// 跳转到指定题目
    Goto(usize),
    /// 请求交卷（进入确认步骤）
    RequestSubmit,
    /// 确认交卷（不可逆）
    ConfirmSubmit,
    /// 页面可见性变化
    Visibility(VisibilitySignal),
}

/// 会话运行器
pub struct SessionRunner<S: SubmissionApi> {
    session: SessionCell,
    exam: Arc<ExamDefinition>,
    channel_handle: ChannelHandle,
    flow: SubmitFlow<S>,
    monitor: VisibilityMonitor,
    triggers_rx: mpsc::UnboundedReceiver<SubmitReason>,
    notices: mpsc::UnboundedSender<SessionNotice>,
}

impl<S: SubmissionApi> SessionRunner<S> {
    /// 创建会话运行器
    pub fn new(
        session: SessionCell,
        exam: Arc<ExamDefinition>,
        channel_handle: ChannelHandle,
        flow: SubmitFlow<S>,
        monitor: VisibilityMonitor,
        triggers_rx: mpsc::UnboundedReceiver<SubmitReason>,
        notices: mpsc::UnboundedSender<SessionNotice>,
    ) -> Self {
        Self {
            session,
            exam,
            channel_handle,
            flow,
            monitor,
            triggers_rx,
            notices,
        }
    }

    /// 运行会话主循环，直到交卷或宿主离开
    ///
    /// # 参数
    /// - `host_rx`: 宿主事件接收端
    /// - `signals_rx`: 通道信号接收端
    /// - `timer_task`: 倒计时任务句柄（拆除时停表）
    /// - `channel`: 实时通道本体（拆除时有序断开）
    ///
    /// # 返回
    /// 返回交卷后的去向
    pub async fn run(
        mut self,
        mut host_rx: mpsc::UnboundedReceiver<HostEvent>,
        mut signals_rx: mpsc::UnboundedReceiver<ChannelSignal>,
        timer_task: JoinHandle<()>,
        channel: RealtimeChannel,
    ) -> Result<RouteTarget> {
        let route = loop {
            tokio::select! {
                Some(reason) = self.triggers_rx.recv() => {
                    if let Some(route) = self.flow.run(reason).await {
                        break route;
                    }
                }
                Some(event) = host_rx.recv() => {
                    if let Some(route) = self.on_host_event(event).await {
                        break route;
                    }
                }
                Some(signal) = signals_rx.recv() => {
                    self.on_channel_signal(signal);
                }
                else => {
                    // 所有事件源都已关闭，宿主离开，按弃考处理
                    warn!("⚠️ 事件源全部关闭，结束会话");
                    break RouteTarget::ExamList;
                }
            }
        };

        // 有序拆除：停表 → 监视器随运行器一起失效 → leaveExam → 断开
        timer_task.abort();
        channel.shutdown().await;

        Ok(route)
    }

    /// 处理宿主事件
    async fn on_host_event(&mut self, event: HostEvent) -> Option<RouteTarget> {
        match event {
            HostEvent::Answer { question_id, value } => {
                let Some(exam_question) = self.exam.find_question(&question_id) else {
                    warn!("⚠️ 忽略未知题目的作答: {}", question_id);
                    return None;
                };
                info!(
                    "✍️ 已记录作答: {} | {}",
                    question_id,
                    truncate_text(&strip_html(&exam_question.question.content), 20)
                );
                self.session.lock().record_answer(question_id, value);
                None
            }
            HostEvent::ToggleFlag(question_id) => {
                self.session.lock().toggle_flag(&question_id);
                None
            }
            HostEvent::Goto(index) => {
                self.session.lock().goto_question(index);
                None
            }
            HostEvent::RequestSubmit => {
                // 手动交卷先过确认步骤，展示进度后等待宿主确认
                let (answered, time_left, tab_switches) = {
                    let state = self.session.lock();
                    (
                        state.answered_count(),
                        state.time_left_seconds,
                        state.tab_switch_count,
                    )
                };
                let _ = self.notices.send(SessionNotice::ConfirmSubmit {
                    answered,
                    total: self.exam.question_count(),
                    time_left_seconds: time_left,
                    tab_switches,
                });
                None
            }
            HostEvent::ConfirmSubmit => self.flow.run(SubmitReason::Manual).await,
            HostEvent::Visibility(signal) => {
                self.monitor.on_signal(signal);
                None
            }
        }
    }

    /// 处理通道信号
    fn on_channel_signal(&mut self, signal: ChannelSignal) {
        match signal {
            ChannelSignal::Event(InboundEvent::JoinAck) => {
                info!("✓ 已进入监考房间");
            }
            ChannelSignal::Event(InboundEvent::OpenExam) => {
                info!("🟢 教师已开考，闸门打开");
                self.session.lock().exam_opened = true;
                self.channel_handle.emit(OutboundEvent::TabIn {
                    status: PresenceStatus::TakingExam,
                });
            }
            ChannelSignal::Event(InboundEvent::PauseExam) => {
                info!("🟡 教师已暂停，闸门关闭");
                self.session.lock().exam_opened = false;
                self.channel_handle.emit(OutboundEvent::TabIn {
                    status: PresenceStatus::Waiting,
                });
            }
            ChannelSignal::Error(message) => {
                // 传输错误不终止会话
                warn!("⚠️ 实时通道异常: {}", message);
                let _ = self.notices.send(SessionNotice::ChannelWarning(message));
            }
            ChannelSignal::Closed => {
                warn!("⚠️ 实时通道已关闭，会话继续");
                let _ = self
                    .notices
                    .send(SessionNotice::ChannelWarning("连接已断开".to_string()));
            }
        }
    }
}
