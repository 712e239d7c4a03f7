//! 实时通道 - 基础设施层
//!
//! 持有唯一的 websocket 资源，只暴露"收发房间事件"的能力
//!
//! 职责：
//! - 连接到以 (试卷, 小组, 学生) 为键的房间并宣告到场
//! - 将入站帧解析为 [`InboundEvent`]，交给上层处理
//! - 通过 [`ChannelHandle`] 接收出站事件，按入队顺序发送
//! - 不认识 SessionState / 提交流程
//!
//! 拆除顺序约定：先发 leaveExam，再发关闭帧。写端任务按队列顺序
//! 逐条发送，leaveExam 不会被关闭帧抢先

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use phf::phf_map;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::workflow::SessionCtx;

/// 到场状态（presence 事件携带）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceStatus {
    /// 等待开考
    Waiting,
    /// 作答中
    TakingExam,
    /// 切出考试页面
    OutOfExam,
}

impl PresenceStatus {
    /// 获取线上格式的状态字符串
    pub fn as_str(self) -> &'static str {
        match self {
            PresenceStatus::Waiting => "waiting",
            PresenceStatus::TakingExam => "taking_exam",
            PresenceStatus::OutOfExam => "out_of_exam",
        }
    }
}

/// 出站事件（客户端 -> 监考房间）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// 进入房间并宣告到场
    JoinExam {
        tab_count: u32,
        status: PresenceStatus,
    },
    /// 切出页面
    TabOut,
    /// 切回页面
    TabIn { status: PresenceStatus },
    /// 交卷通知（仅通知，评分提交走 HTTP 边界）
    SubmitExam,
    /// 离开房间
    LeaveExam,
}

impl OutboundEvent {
    /// 获取事件名
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::JoinExam { .. } => "joinExam",
            OutboundEvent::TabOut => "tabOut",
            OutboundEvent::TabIn { .. } => "tabIn",
            OutboundEvent::SubmitExam => "submitExam",
            OutboundEvent::LeaveExam => "leaveExam",
        }
    }

    /// 构造线上帧（JSON 文本）
    ///
    /// # 参数
    /// - `ctx`: 会话上下文，提供房间键和学生信息
    pub fn to_frame(&self, ctx: &SessionCtx) -> String {
        let data = match self {
            OutboundEvent::JoinExam { tab_count, status } => json!({
                "examId": ctx.exam_id,
                "studyGroupId": ctx.study_group_id,
                "studentId": ctx.student_id,
                "name": ctx.student_name,
                "code": ctx.student_code,
                "avatar": ctx.student_avatar,
                "tab_count": tab_count,
                "status": status.as_str(),
            }),
            OutboundEvent::TabOut => json!({
                "examId": ctx.exam_id,
                "studyGroupId": ctx.study_group_id,
                "studentId": ctx.student_id,
                "status": PresenceStatus::OutOfExam.as_str(),
            }),
            OutboundEvent::TabIn { status } => json!({
                "examId": ctx.exam_id,
                "studyGroupId": ctx.study_group_id,
                "studentId": ctx.student_id,
                "status": status.as_str(),
            }),
            OutboundEvent::SubmitExam | OutboundEvent::LeaveExam => json!({
                "examId": ctx.exam_id,
                "studyGroupId": ctx.study_group_id,
                "studentId": ctx.student_id,
            }),
        };

        json!({ "event": self.name(), "data": data }).to_string()
    }
}

/// 入站事件（监考房间 -> 客户端）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundEvent {
    /// 进房确认，仅作信息
    JoinAck,
    /// 教师开考
    OpenExam,
    /// 教师暂停
    PauseExam,
}

/// 入站事件名表
static INBOUND_EVENTS: phf::Map<&'static str, InboundEvent> = phf_map! {
    "joinExam" => InboundEvent::JoinAck,
    "openExam" => InboundEvent::OpenExam,
    "pauseExam" => InboundEvent::PauseExam,
};

/// 通道信号（入站事件 + 传输层状况）
#[derive(Debug, Clone)]
pub enum ChannelSignal {
    /// 收到入站事件
    Event(InboundEvent),
    /// 传输错误（非致命，上层提示后继续）
    Error(String),
    /// 连接已关闭
    Closed,
}

/// 写端命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterCommand {
    /// 发送一个出站事件
    Emit(OutboundEvent),
    /// 发送关闭帧并结束写端
    Disconnect,
}

/// 通道句柄
///
/// 可克隆，分发给需要上报事件的组件（切屏监视器、提交流程）
#[derive(Clone)]
pub struct ChannelHandle {
    tx: mpsc::UnboundedSender<WriterCommand>,
    ctx: Arc<SessionCtx>,
}

impl ChannelHandle {
    /// 发送出站事件
    ///
    /// 通道已关闭时只记录告警，不向上冒泡——拆除阶段的迟到事件属于正常情况
    pub fn emit(&self, event: OutboundEvent) {
        let name = event.name();
        if self.tx.send(WriterCommand::Emit(event)).is_err() {
            warn!("⚠️ 事件 {} 未能入队: 通道已关闭", name);
        }
    }

    /// 请求写端发送关闭帧并结束
    pub fn disconnect(&self) {
        let _ = self.tx.send(WriterCommand::Disconnect);
    }

    /// 获取会话上下文
    pub fn ctx(&self) -> &SessionCtx {
        &self.ctx
    }

    /// 创建离线句柄（测试和演练用，出站命令从返回的接收端取出）
    pub fn detached(ctx: Arc<SessionCtx>) -> (Self, mpsc::UnboundedReceiver<WriterCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, ctx }, rx)
    }
}

/// 实时通道
///
/// 持有读写两个后台任务，生命周期与会话一致
pub struct RealtimeChannel {
    handle: ChannelHandle,
    writer_task: JoinHandle<()>,
    reader_task: JoinHandle<()>,
}

impl RealtimeChannel {
    /// 连接房间
    ///
    /// 连接成功后立即宣告到场（tab_count = 1, status = waiting）
    ///
    /// # 参数
    /// - `url`: 实时通道地址
    /// - `ctx`: 会话上下文
    ///
    /// # 返回
    /// 返回通道本体和入站信号接收端
    pub async fn connect(
        url: &str,
        ctx: Arc<SessionCtx>,
    ) -> AppResult<(Self, mpsc::UnboundedReceiver<ChannelSignal>)> {
        let (socket, response) = connect_async(url)
            .await
            .map_err(|e| AppError::channel_connect_failed(url, e))?;

        info!("🔌 实时通道已连接: {} (HTTP {})", url, response.status());

        let (mut write, mut read) = socket.split();

        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<WriterCommand>();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel::<ChannelSignal>();

        let writer_ctx = ctx.clone();
        let writer_task = tokio::spawn(async move {
            while let Some(command) = cmd_rx.recv().await {
                match command {
                    WriterCommand::Emit(event) => {
                        let frame = event.to_frame(&writer_ctx);
                        debug!("📤 发送事件 {}: {}", event.name(), frame);
                        if let Err(e) = write.send(Message::Text(frame)).await {
                            warn!("⚠️ 发送事件 {} 失败: {}", event.name(), e);
                            break;
                        }
                    }
                    WriterCommand::Disconnect => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        });

        let reader_task = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => match parse_inbound(&text) {
                        Some(event) => {
                            if signal_tx.send(ChannelSignal::Event(event)).is_err() {
                                break;
                            }
                        }
                        None => debug!("收到无法识别的帧: {}", text),
                    },
                    Ok(Message::Close(_)) => {
                        let _ = signal_tx.send(ChannelSignal::Closed);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = signal_tx.send(ChannelSignal::Error(e.to_string()));
                        break;
                    }
                }
            }
        });

        let handle = ChannelHandle { tx: cmd_tx, ctx };

        // 宣告到场
        handle.emit(OutboundEvent::JoinExam {
            tab_count: 1,
            status: PresenceStatus::Waiting,
        });

        Ok((
            Self {
                handle,
                writer_task,
                reader_task,
            },
            signal_rx,
        ))
    }

    /// 获取可克隆的通道句柄
    pub fn handle(&self) -> ChannelHandle {
        self.handle.clone()
    }

    /// 有序拆除：先 leaveExam，再关闭连接
    ///
    /// 写端任务按队列顺序发送，保证 leaveExam 先于关闭帧到达；
    /// 写端结束后再中止读端，之后不会再有任何回调触发
    pub async fn shutdown(self) {
        self.handle.emit(OutboundEvent::LeaveExam);
        self.handle.disconnect();
        if let Err(e) = self.writer_task.await {
            warn!("⚠️ 通道写端任务结束异常: {}", e);
        }
        self.reader_task.abort();
        info!("🔌 实时通道已断开");
    }
}

/// 解析入站帧
///
/// 帧格式为 `{"event": 名称, "data": ...}`，事件名查表分发
fn parse_inbound(text: &str) -> Option<InboundEvent> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let name = value.get("event")?.as_str()?;
    INBOUND_EVENTS.get(name).copied()
}
