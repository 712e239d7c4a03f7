//! 倒计时引擎 - 业务能力层
//!
//! 职责：
//! - 开放期间每秒将剩余时间减一
//! - 归零时触发 timeout 终止信号
//! - 不认识题目 / 提交流程
//!
//! `time_left_seconds` 只有本引擎一个写者。每一跳都重新挂表
//! （固定 1 秒的 sleep），不跨跳累积漂移；锁存置位或归零后
//! 不再安排下一跳

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::workflow::{SessionCell, SubmitReason};

/// 倒计时引擎
pub struct TimerEngine {
    session: SessionCell,
    triggers: mpsc::UnboundedSender<SubmitReason>,
}

/// 单跳结果
enum TickOutcome {
    /// 会话已提交，停止计时
    Stop,
    /// 闸门关闭，本跳不减
    Gated,
    /// 正常减一
    Running(u32),
    /// 归零
    TimedOut,
}

impl TimerEngine {
    /// 创建倒计时引擎
    pub fn new(session: SessionCell, triggers: mpsc::UnboundedSender<SubmitReason>) -> Self {
        Self { session, triggers }
    }

    /// 启动计时任务
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        loop {
            // 每跳重新挂表
            tokio::time::sleep(Duration::from_secs(1)).await;

            match self.tick() {
                TickOutcome::Stop => break,
                TickOutcome::Gated => continue,
                TickOutcome::Running(left) => {
                    if left % 60 == 0 {
                        debug!("⏱️ 剩余时间: {} 秒", left);
                    }
                }
                TickOutcome::TimedOut => {
                    info!("⏰ 考试时间到，触发自动交卷");
                    let _ = self.triggers.send(SubmitReason::Timeout);
                    break;
                }
            }
        }
    }

    /// 执行一跳（锁内检查 + 减一）
    fn tick(&self) -> TickOutcome {
        let mut state = self.session.lock();

        if state.is_submitted() {
            return TickOutcome::Stop;
        }
        if !state.exam_opened {
            return TickOutcome::Gated;
        }
        if state.time_left_seconds == 0 {
            // 归零的那一跳已经触发过 timeout 并停表
            return TickOutcome::Stop;
        }

        state.time_left_seconds -= 1;

        if state.time_left_seconds == 0 {
            TickOutcome::TimedOut
        } else {
            TickOutcome::Running(state.time_left_seconds)
        }
    }
}
