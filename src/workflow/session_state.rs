//! 会话状态 - 流程层
//!
//! 一次考试会话的全部可变状态。整个会话只有一个 `SessionState` 实例，
//! 通过 `SessionCell` 共享给各协作组件，各字段遵守单写者纪律：
//!
//! - `exam_opened`：仅通道事件处理写
//! - `time_left_seconds`：仅计时器写
//! - `tab_switch_count`：仅切屏监视器写
//! - `answers` / `flagged_questions` / `current_question_index`：仅宿主事件写
//! - `is_submitted`：写一次锁存，唯一需要抢占保护的状态

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::{AnswerValue, ExamDefinition};

/// 会话状态
#[derive(Debug)]
pub struct SessionState {
    /// 考试是否开放（教师端 openExam / pauseExam 控制的闸门）
    pub exam_opened: bool,

    /// 剩余时间（秒），开放期间单调递减，暂停期间冻结
    pub time_left_seconds: u32,

    /// 切屏次数，单调递增
    pub tab_switch_count: u32,

    /// 作答记录（题目ID -> 作答值）
    pub answers: HashMap<String, AnswerValue>,

    /// 标记待复查的题目（仅界面书签，不参与提交）
    pub flagged_questions: HashSet<String>,

    /// 当前题目索引
    pub current_question_index: usize,

    /// 题目总数（用于索引越界保护）
    question_count: usize,

    /// 提交锁存，置位后不可回退
    is_submitted: bool,
}

impl SessionState {
    /// 从试卷定义创建会话状态
    ///
    /// 剩余时间按时长换算为秒；练习类型进入即开放，
    /// 其余类型等待教师端的 openExam 事件
    pub fn new(exam: &ExamDefinition) -> Self {
        Self {
            exam_opened: exam.test_type.is_pre_opened(),
            time_left_seconds: exam.duration_minutes * 60,
            tab_switch_count: 0,
            answers: HashMap::new(),
            flagged_questions: HashSet::new(),
            current_question_index: 0,
            question_count: exam.question_count(),
            is_submitted: false,
        }
    }

    /// 是否已提交
    pub fn is_submitted(&self) -> bool {
        self.is_submitted
    }

    /// 尝试进入提交流程（检查并置位，不可分割）
    ///
    /// # 返回
    /// 首次调用返回 true（赢得提交权），之后一律返回 false
    pub fn try_begin_submit(&mut self) -> bool {
        if self.is_submitted {
            return false;
        }
        self.is_submitted = true;
        true
    }

    /// 记录作答（已提交后忽略）
    pub fn record_answer(&mut self, question_id: String, value: AnswerValue) {
        if self.is_submitted {
            return;
        }
        self.answers.insert(question_id, value);
    }

    /// 切换题目标记
    pub fn toggle_flag(&mut self, question_id: &str) {
        if self.is_submitted {
            return;
        }
        if !self.flagged_questions.remove(question_id) {
            self.flagged_questions.insert(question_id.to_string());
        }
    }

    /// 跳转到指定题目（越界时收敛到边界）
    pub fn goto_question(&mut self, index: usize) {
        if self.question_count == 0 {
            self.current_question_index = 0;
            return;
        }
        self.current_question_index = index.min(self.question_count - 1);
    }

    /// 已作答题目数
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }
}

/// 共享会话单元
///
/// 所有协作组件持有同一个单元，读到的永远是实时状态，
/// 不存在订阅时刻的快照
#[derive(Clone)]
pub struct SessionCell {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionCell {
    /// 创建共享单元
    pub fn new(state: SessionState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// 获取状态锁
    ///
    /// 锁中毒时恢复内部数据继续使用，状态各字段单写者，
    /// 不存在半更新的中间态
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// 是否已提交
    pub fn is_submitted(&self) -> bool {
        self.lock().is_submitted()
    }

    /// 尝试进入提交流程（见 [`SessionState::try_begin_submit`]）
    pub fn try_begin_submit(&self) -> bool {
        self.lock().try_begin_submit()
    }
}
