//! 作答数据模型
//!
//! `AnswerValue` 是内存中的作答形态（随题型变化），
//! `NormalizedAnswer` / `SubmissionPayload` 是提交接口的线上格式

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::question::QuestionType;

/// 视频弹题单个弹出点的已选内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupChoice {
    /// 选中的值
    pub value: String,

    /// 选中项的显示文本
    #[serde(default)]
    pub text: String,
}

/// 视频弹题单个弹出点的作答记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupAnswer {
    /// 已选内容
    pub content: PopupChoice,

    /// 作答顺序
    #[serde(default)]
    pub order_index: u32,
}

/// 作答值（形态随题型变化）
///
/// - 单选：选项值字符串
/// - 多选：选项值数组
/// - 连线：左侧选项ID -> 右侧选项ID
/// - 拖拽：区域名 -> 放入的值列表
/// - 排序：值 -> 序号
/// - 视频弹题：弹出点序号（字符串） -> 作答记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// 单选题作答
    Single(String),
    /// 多选题作答
    Multiple(Vec<String>),
    /// 拖拽题作答（区域 -> 值列表）
    DragDrop(BTreeMap<String, Vec<String>>),
    /// 排序题作答（值 -> 序号）
    Ordering(BTreeMap<String, u32>),
    /// 视频弹题作答（弹出点序号 -> 作答记录）
    VideoPopup(BTreeMap<String, PopupAnswer>),
    /// 连线题作答（左 -> 右），放在最后以免空映射被提前吞掉
    Matching(BTreeMap<String, String>),
}

impl AnswerValue {
    /// 判断作答形态是否与题型匹配
    ///
    /// 空映射无法从形态上区分题型，按匹配处理，交给归一化器按题型解释
    pub fn matches(&self, question_type: QuestionType) -> bool {
        match (self, question_type) {
            (AnswerValue::Single(_), QuestionType::SingleChoice) => true,
            (AnswerValue::Multiple(_), QuestionType::MultipleSelect) => true,
            (AnswerValue::Matching(_), QuestionType::Matching) => true,
            (AnswerValue::DragDrop(_), QuestionType::DragDrop) => true,
            (AnswerValue::Ordering(_), QuestionType::Ordering) => true,
            (AnswerValue::VideoPopup(_), QuestionType::VideoPopup) => true,
            // 反序列化时空映射会落到第一个映射变体上
            (AnswerValue::DragDrop(m), _) => m.is_empty(),
            (AnswerValue::Matching(m), _) => m.is_empty(),
            (AnswerValue::Ordering(m), _) => m.is_empty(),
            (AnswerValue::VideoPopup(m), _) => m.is_empty(),
            _ => false,
        }
    }
}

/// 归一化后的单题提交格式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAnswer {
    /// 题目ID
    pub question_id: String,

    /// 题型
    pub question_type: QuestionType,

    /// 题目在试卷中的序号（从1开始）
    pub order_index: u32,

    /// 归一化后的作答内容（未作答为 null，题目仍须出现在提交中）
    pub answer_content: JsonValue,
}

/// 交卷请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    /// 全部题目的归一化作答（数量恒等于试卷题目数）
    pub answers: Vec<NormalizedAnswer>,

    /// 实际用时（秒）
    pub time_spent: u64,

    /// 切屏次数
    pub tab_switches: u32,
}
