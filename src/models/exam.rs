//! 试卷与考试场次数据模型
//!
//! `ExamDefinition` 在会话引导时一次性拉取，之后不再变更

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::models::question::Question;

/// 考试类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    /// 练习（无需教师开考，进入即开放）
    Exercise,
    /// 期中考试
    Midterm,
    /// 期末考试
    Final,
}

impl TestType {
    /// 练习类型不等待 openExam 事件，进入会话即视为开放
    pub fn is_pre_opened(self) -> bool {
        matches!(self, TestType::Exercise)
    }
}

/// 作答状态（来自考勤接口）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleStatus {
    /// 未开始
    NotStarted,
    /// 作答中
    Taking,
    /// 已提交（禁止再次进入）
    Submitted,
    /// 服务端新增的未知状态，一律按可进入处理
    #[serde(other)]
    Unknown,
}

/// 试卷中的一道题（题目ID + 题目内容）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamQuestion {
    /// 题目ID
    pub id: String,

    /// 题目内容
    pub question: Question,
}

/// 试卷定义
///
/// 加载后不可变，会话期间所有组件只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamDefinition {
    /// 试卷ID
    pub id: String,

    /// 科目
    pub subject: String,

    /// 试卷标题
    #[serde(default)]
    pub title: String,

    /// 题目列表（有序，提交顺序以此为准）
    pub exam_questions: Vec<ExamQuestion>,

    /// 考试时长（分钟）
    pub duration_minutes: u32,

    /// 切屏次数上限（达到即自动交卷）
    pub max_tab_switch: u32,

    /// 考试类型
    pub test_type: TestType,

    /// 是否允许考后查看答卷
    #[serde(default)]
    pub allow_review: bool,

    /// 是否允许考后查看得分（决定提交后的跳转目标）
    #[serde(default)]
    pub allow_review_point: bool,
}

impl ExamDefinition {
    /// 题目总数
    pub fn question_count(&self) -> usize {
        self.exam_questions.len()
    }

    /// 按题目ID查找
    pub fn find_question(&self, question_id: &str) -> Option<&ExamQuestion> {
        self.exam_questions.iter().find(|q| q.id == question_id)
    }

    /// 校验试卷数据完整性
    ///
    /// 每道题的 answer_config.kind 必须与题型一致，
    /// 不一致视为会话级数据错误，直接拒绝进入
    pub fn validate(&self) -> Result<(), SessionError> {
        for exam_question in &self.exam_questions {
            if let Some(found) = exam_question.question.config_mismatch() {
                return Err(SessionError::AnswerConfigMismatch {
                    question_id: exam_question.id.clone(),
                    expected: exam_question.question.question_type.code(),
                    found: found.code(),
                });
            }
        }
        Ok(())
    }
}

/// 考试场次信息（试卷ID + 学习小组ID 换取）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptInfo {
    /// 场次ID（提交时使用，区别于试卷ID）
    pub id: String,

    /// 当前作答状态
    pub handle_status: HandleStatus,
}
