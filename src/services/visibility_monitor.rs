//! 切屏监视器 - 业务能力层
//!
//! 职责：
//! - 处理宿主上报的前台/后台切换信号
//! - 切出时上报 tabOut、累加切屏次数、对照上限
//! - 达到上限时触发一次 tab_switch 终止信号
//! - 不关心提交流程的后续
//!
//! `tab_switch_count` 只有本监视器一个写者。触发过一次终止信号
//! 或会话已提交后，监视器对后续信号保持沉默，不会重复计数

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::infrastructure::{ChannelHandle, OutboundEvent, PresenceStatus};
use crate::workflow::{SessionCell, SessionNotice, SubmitReason};

/// 页面可见性信号（由宿主外壳上报）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilitySignal {
    /// 切出页面（进入后台）
    Background,
    /// 切回页面（回到前台）
    Foreground,
}

/// 切屏监视器
pub struct VisibilityMonitor {
    session: SessionCell,
    channel: ChannelHandle,
    max_tab_switch: u32,
    triggers: mpsc::UnboundedSender<SubmitReason>,
    notices: mpsc::UnboundedSender<SessionNotice>,
    fired: bool,
}

impl VisibilityMonitor {
    /// 创建切屏监视器
    pub fn new(
        session: SessionCell,
        channel: ChannelHandle,
        max_tab_switch: u32,
        triggers: mpsc::UnboundedSender<SubmitReason>,
        notices: mpsc::UnboundedSender<SessionNotice>,
    ) -> Self {
        Self {
            session,
            channel,
            max_tab_switch,
            triggers,
            notices,
            fired: false,
        }
    }

    /// 处理一次可见性信号
    ///
    /// 同步处理，不包含任何挂起点
    pub fn on_signal(&mut self, signal: VisibilitySignal) {
        if self.fired || self.session.is_submitted() {
            return;
        }

        match signal {
            VisibilitySignal::Background => self.on_background(),
            VisibilitySignal::Foreground => self.on_foreground(),
        }
    }

    /// 切出：先上报 tabOut，再计数，再对照上限
    fn on_background(&mut self) {
        // 开考前的切换不计数
        if !self.session.lock().exam_opened {
            return;
        }

        self.channel.emit(OutboundEvent::TabOut);

        let new_count = {
            let mut state = self.session.lock();
            state.tab_switch_count += 1;
            state.tab_switch_count
        };

        if new_count >= self.max_tab_switch {
            warn!(
                "🚫 切屏次数达到上限 ({}/{})，触发自动交卷",
                new_count, self.max_tab_switch
            );
            self.fired = true;
            let _ = self.triggers.send(SubmitReason::TabSwitch);
        } else {
            info!("⚠️ 检测到切屏: {}/{}", new_count, self.max_tab_switch);
            let _ = self.notices.send(SessionNotice::TabSwitchWarning {
                count: new_count,
                max: self.max_tab_switch,
            });
        }
    }

    /// 切回：按闸门状态上报 tabIn
    fn on_foreground(&self) {
        let status = if self.session.lock().exam_opened {
            PresenceStatus::TakingExam
        } else {
            PresenceStatus::Waiting
        };
        self.channel.emit(OutboundEvent::TabIn { status });
    }
}
