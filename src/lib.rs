//! # Exam Session
//!
//! 在线考试的考中会话控制器
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（websocket 连接），只暴露能力
//! - `RealtimeChannel` - 唯一的 socket owner，提供房间事件收发能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单一职责
//! - `TimerEngine` - 倒计时能力（开放期间每秒减一，归零触发 timeout）
//! - `VisibilityMonitor` - 切屏计数能力（超限触发 tab_switch）
//! - `normalizer` - 按题型归一化作答的能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次会话"的状态与交卷流程
//! - `SessionState` / `SessionCell` - 共享会话状态（单写者纪律 + 提交锁存）
//! - `SubmitFlow` - 交卷编排（抢锁存 → 归一化 → 通知 → 提交 → 去向）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/bootstrap` - 会话引导闸门（身份 / 试卷 / 场次状态）
//! - `orchestrator/session_runner` - 事件中枢，三路终止信号在此裁决
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::ExamClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChannelHandle, ChannelSignal, InboundEvent, OutboundEvent,
    PresenceStatus, RealtimeChannel};
pub use models::{AnswerValue, ExamDefinition, Question, QuestionType, SubmissionPayload};
pub use orchestrator::{App, HostEvent, SessionRunner};
pub use services::{TimerEngine, VisibilityMonitor, VisibilitySignal};
pub use workflow::{
    RouteTarget, SessionCell, SessionCtx, SessionNotice, SessionState, SubmissionApi, SubmitFlow,
    SubmitReason,
};
