//! 面向宿主界面的会话提示
//!
//! 控制器不直接操作界面，所有需要用户感知的信息都以提示形式
//! 推给宿主（命令行驱动程序或嵌入方）

/// 会话提示
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    /// 切屏告警（非阻塞提示，当前次数 / 上限）
    TabSwitchWarning { count: u32, max: u32 },

    /// 手动交卷确认（不可逆操作，展示作答进度后等待宿主确认）
    ConfirmSubmit {
        answered: usize,
        total: usize,
        time_left_seconds: u32,
        tab_switches: u32,
    },

    /// 实时通道告警（非致命，会话继续）
    ChannelWarning(String),

    /// 交卷请求失败（不自动重试，仍会离开考试）
    SubmitFailed(String),
}
