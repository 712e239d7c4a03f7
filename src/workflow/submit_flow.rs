//! 交卷流程 - 流程层
//!
//! 核心职责：把一次终止信号变成恰好一次的评分提交
//!
//! 流程顺序：
//! 1. 抢提交锁存（任何挂起点之前的第一条同步语句）
//! 2. 锁内归一化整卷作答、换算用时
//! 3. 通道上报 submitExam（仅通知）
//! 4. HTTP 提交评分请求
//! 5. 决定去向（成绩页 / 考试列表）
//!
//! 三个终止信号源（倒计时归零、切屏超限、手动确认）不论以何种
//! 交错到达，只有第一个能通过第 1 步；其余观察到锁存已置位，
//! 直接返回

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::infrastructure::{ChannelHandle, OutboundEvent};
use crate::models::{ExamDefinition, SubmissionPayload};
use crate::services::normalizer;
use crate::workflow::{SessionCell, SessionNotice};

/// 终止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitReason {
    /// 学生确认手动交卷
    Manual,
    /// 倒计时归零
    Timeout,
    /// 切屏次数达到上限
    TabSwitch,
}

impl SubmitReason {
    /// 获取原因代码（日志与上报用）
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitReason::Manual => "manual",
            SubmitReason::Timeout => "timeout",
            SubmitReason::TabSwitch => "tab_switch",
        }
    }
}

/// 交卷后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// 成绩/小结页（试卷允许查看得分时）
    Results,
    /// 考试列表
    ExamList,
}

/// 评分提交接口（HTTP 边界的收口）
///
/// 生产实现为 [`crate::clients::ExamClient`]，测试用记录桩替代
pub trait SubmissionApi {
    /// 按场次ID提交整卷作答
    fn submit_attempt(
        &self,
        attempt_id: &str,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// 交卷流程
pub struct SubmitFlow<S: SubmissionApi> {
    session: SessionCell,
    exam: Arc<ExamDefinition>,
    attempt_id: String,
    api: S,
    channel: ChannelHandle,
    notices: mpsc::UnboundedSender<SessionNotice>,
}

impl<S: SubmissionApi> SubmitFlow<S> {
    /// 创建交卷流程
    pub fn new(
        session: SessionCell,
        exam: Arc<ExamDefinition>,
        attempt_id: String,
        api: S,
        channel: ChannelHandle,
        notices: mpsc::UnboundedSender<SessionNotice>,
    ) -> Self {
        Self {
            session,
            exam,
            attempt_id,
            api,
            channel,
            notices,
        }
    }

    /// 执行一次交卷
    ///
    /// # 参数
    /// - `reason`: 终止原因
    ///
    /// # 返回
    /// 赢得提交权时返回去向；锁存已被别的信号抢先时返回 None
    pub async fn run(&self, reason: SubmitReason) -> Option<RouteTarget> {
        // 抢提交权。必须是本函数第一条语句，之后才允许出现挂起点
        if !self.session.try_begin_submit() {
            info!("提交锁存已置位，忽略终止信号 ({})", reason.as_str());
            return None;
        }

        let payload = self.build_payload();

        info!(
            "📝 开始交卷: 原因={} 用时={}秒 切屏={}次 条目={}",
            reason.as_str(),
            payload.time_spent,
            payload.tab_switches,
            payload.answers.len()
        );

        // 通知监考房间（评分提交走 HTTP 边界，此处仅通知）
        self.channel.emit(OutboundEvent::SubmitExam);

        let route = match self.api.submit_attempt(&self.attempt_id, &payload).await {
            Ok(()) => {
                info!("✅ 交卷成功");
                if self.exam.allow_review_point {
                    RouteTarget::Results
                } else {
                    RouteTarget::ExamList
                }
            }
            Err(e) => {
                // 不自动重试：提示后仍然离开考试，幂等由服务端按场次ID保证
                error!("❌ 交卷请求失败: {:#}", e);
                let _ = self
                    .notices
                    .send(SessionNotice::SubmitFailed(format!("{:#}", e)));
                RouteTarget::ExamList
            }
        };

        Some(route)
    }

    /// 在锁内取状态快照并组装请求体
    fn build_payload(&self) -> SubmissionPayload {
        let state = self.session.lock();
        let answers = normalizer::normalize_all(&self.exam, &state.answers);
        let total_seconds = u64::from(self.exam.duration_minutes) * 60;
        let time_spent = total_seconds.saturating_sub(u64::from(state.time_left_seconds));

        SubmissionPayload {
            answers,
            time_spent,
            tab_switches: state.tab_switch_count,
        }
    }
}
