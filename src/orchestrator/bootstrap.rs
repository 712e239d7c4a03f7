//! 会话引导 - 编排层
//!
//! 进入考试前的有效性闸门：
//! 1. 三个身份标识（试卷 / 小组 / 学生）缺一不可
//! 2. 拉取试卷并校验数据完整性
//! 3. 换取场次；已提交过的场次直接拒绝进入
//!
//! 任何一步失败都不会打开实时通道、不会启动计时器

use std::sync::Arc;

use tracing::info;

use crate::clients::ExamClient;
use crate::error::{AppError, AppResult, SessionError};
use crate::models::{ExamDefinition, HandleStatus};
use crate::workflow::SessionCtx;

/// 引导结果
pub struct BootstrapOutcome {
    /// 校验通过的试卷定义
    pub exam: Arc<ExamDefinition>,

    /// 本次考试的场次ID
    pub attempt_id: String,
}

/// 校验身份标识是否齐全
pub fn validate_identity(ctx: &SessionCtx) -> AppResult<()> {
    if ctx.exam_id.is_empty() {
        return Err(AppError::missing_identity("exam_id"));
    }
    if ctx.study_group_id.is_empty() {
        return Err(AppError::missing_identity("study_group_id"));
    }
    if ctx.student_id.is_empty() {
        return Err(AppError::missing_identity("student_id"));
    }
    Ok(())
}

/// 执行会话引导
///
/// # 参数
/// - `client`: 考试 API 客户端
/// - `ctx`: 会话上下文
///
/// # 返回
/// 返回试卷定义和场次ID；无效会话返回错误，调用方负责提示并跳转
pub async fn bootstrap(client: &ExamClient, ctx: &SessionCtx) -> AppResult<BootstrapOutcome> {
    validate_identity(ctx)?;

    info!("📥 正在拉取试卷 {} ...", ctx.exam_id);
    let exam = client.fetch_exam(&ctx.exam_id).await?;
    exam.validate().map_err(AppError::Session)?;

    info!(
        "✓ 试卷就绪: {} | {} | {} 道题 | 时长 {} 分钟 | 切屏上限 {}",
        exam.title,
        exam.subject,
        exam.question_count(),
        exam.duration_minutes,
        exam.max_tab_switch
    );

    let attempt = client
        .resolve_attempt(&ctx.exam_id, &ctx.study_group_id, &ctx.student_id)
        .await?;

    if attempt.handle_status == HandleStatus::Submitted {
        return Err(AppError::Session(SessionError::AlreadySubmitted {
            attempt_id: attempt.id,
        }));
    }

    info!("✓ 场次就绪: {}", attempt.id);

    Ok(BootstrapOutcome {
        exam: Arc::new(exam),
        attempt_id: attempt.id,
    })
}
