//! 题目数据模型
//!
//! 题目按 `question_type` 区分六种类型，类型与答案配置（`answer_config`）
//! 必须一一对应，加载时校验，不在运行期兜底

use phf::phf_map;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 题型枚举
///
/// 每种题型对应一种作答数据形态和一个归一化规则，
/// 分发依赖枚举的穷尽匹配，不存在默认分支
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 单选题
    SingleChoice,
    /// 多选题
    MultipleSelect,
    /// 连线题
    Matching,
    /// 排序题
    Ordering,
    /// 拖拽题
    DragDrop,
    /// 视频弹题
    VideoPopup,
}

/// 题型代码表（接口字符串 -> 题型）
static QUESTION_TYPE_CODES: phf::Map<&'static str, QuestionType> = phf_map! {
    "single_choice" => QuestionType::SingleChoice,
    "multiple_select" => QuestionType::MultipleSelect,
    "matching" => QuestionType::Matching,
    "ordering" => QuestionType::Ordering,
    "drag_drop" => QuestionType::DragDrop,
    "video_popup" => QuestionType::VideoPopup,
};

impl QuestionType {
    /// 获取题型代码
    pub fn code(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleSelect => "multiple_select",
            QuestionType::Matching => "matching",
            QuestionType::Ordering => "ordering",
            QuestionType::DragDrop => "drag_drop",
            QuestionType::VideoPopup => "video_popup",
        }
    }

    /// 从代码解析题型
    pub fn from_code(code: &str) -> Option<Self> {
        QUESTION_TYPE_CODES.get(code).copied()
    }

    /// 获取中文名称（仅用于日志显示）
    pub fn name(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "单选题",
            QuestionType::MultipleSelect => "多选题",
            QuestionType::Matching => "连线题",
            QuestionType::Ordering => "排序题",
            QuestionType::DragDrop => "拖拽题",
            QuestionType::VideoPopup => "视频弹题",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 答案选项
///
/// `content` 的形态随题型变化（选项文本、左右列内容、拖拽项等），
/// 统一以 JSON 值承载，由归一化器按题型解释
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    /// 选项ID（提交时用于反查内容）
    pub id: String,

    /// 选项内容（形态随题型变化）
    #[serde(default)]
    pub content: JsonValue,

    /// 选项顺序（可选，服务端排序用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

/// 视频弹题的弹出点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopupTime {
    /// 弹出点的稳定ID（提交时 popup_index 反查为此ID）
    pub id: String,

    /// 弹出时间（秒）
    #[serde(default)]
    pub time_seconds: f64,

    /// 弹出提示文案
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// 题型专属配置
///
/// `kind` 字段必须与所属题目的 `question_type` 一致
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerConfig {
    /// 单选题配置
    SingleChoice {},
    /// 多选题配置
    MultipleSelect {},
    /// 连线题配置
    Matching {},
    /// 排序题配置
    Ordering {},
    /// 拖拽题配置（包含拖拽区域列表）
    DragDrop {
        #[serde(default)]
        zones: Vec<String>,
    },
    /// 视频弹题配置（包含视频地址和弹出点列表）
    VideoPopup {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        video_url: Option<String>,
        #[serde(default)]
        popup_times: Vec<PopupTime>,
    },
}

impl AnswerConfig {
    /// 获取配置对应的题型
    pub fn kind(&self) -> QuestionType {
        match self {
            AnswerConfig::SingleChoice {} => QuestionType::SingleChoice,
            AnswerConfig::MultipleSelect {} => QuestionType::MultipleSelect,
            AnswerConfig::Matching {} => QuestionType::Matching,
            AnswerConfig::Ordering {} => QuestionType::Ordering,
            AnswerConfig::DragDrop { .. } => QuestionType::DragDrop,
            AnswerConfig::VideoPopup { .. } => QuestionType::VideoPopup,
        }
    }

    /// 获取视频弹题的弹出点列表（非视频弹题返回空）
    pub fn popup_times(&self) -> &[PopupTime] {
        match self {
            AnswerConfig::VideoPopup { popup_times, .. } => popup_times,
            _ => &[],
        }
    }
}

/// 题目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// 题型
    pub question_type: QuestionType,

    /// 题干（富文本）
    pub content: String,

    /// 答案选项列表（有序）
    #[serde(default)]
    pub answers: Vec<AnswerOption>,

    /// 题型专属配置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_config: Option<AnswerConfig>,
}

impl Question {
    /// 检查 answer_config 与题型是否一致
    ///
    /// # 返回
    /// 配置缺失视为一致；存在但 kind 不匹配时返回实际的 kind
    pub fn config_mismatch(&self) -> Option<QuestionType> {
        match &self.answer_config {
            Some(config) if config.kind() != self.question_type => Some(config.kind()),
            _ => None,
        }
    }

    /// 按选项ID查找选项
    pub fn find_answer(&self, answer_id: &str) -> Option<&AnswerOption> {
        self.answers.iter().find(|a| a.id == answer_id)
    }
}
