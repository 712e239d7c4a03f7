//! 答案归一化 - 业务能力层
//!
//! 纯转换：把内存中的作答值（[`AnswerValue`]）按题型转成评分接口
//! 期望的线上格式。每种题型一条规则，枚举穷尽分发
//!
//! 容错约定：
//! - 未作答的题目照常产出条目（answer_content 为 null），
//!   评分端按答错计，不能按缺题计
//! - 连线题中无法反查的选项ID对、视频弹题中越界的弹出点序号
//!   静默丢弃，不因个别脏数据拒掉整卷
//! - 作答形态与题型不符时按未作答处理并记录告警

use std::collections::HashMap;

use serde_json::{json, Value as JsonValue};
use tracing::warn;

use crate::models::{
    AnswerValue, ExamDefinition, ExamQuestion, NormalizedAnswer, Question,
};

/// 归一化整卷作答
///
/// # 参数
/// - `exam`: 试卷定义（决定条目顺序）
/// - `answers`: 作答记录（题目ID -> 作答值）
///
/// # 返回
/// 与试卷题目一一对应的归一化条目，顺序与试卷一致，序号从1开始
pub fn normalize_all(
    exam: &ExamDefinition,
    answers: &HashMap<String, AnswerValue>,
) -> Vec<NormalizedAnswer> {
    exam.exam_questions
        .iter()
        .enumerate()
        .map(|(index, exam_question)| {
            normalize_one(
                exam_question,
                (index + 1) as u32,
                answers.get(&exam_question.id),
            )
        })
        .collect()
}

/// 归一化单题作答
///
/// # 参数
/// - `exam_question`: 试卷中的题目
/// - `order_index`: 题目序号（从1开始）
/// - `value`: 作答值，未作答为 None
pub fn normalize_one(
    exam_question: &ExamQuestion,
    order_index: u32,
    value: Option<&AnswerValue>,
) -> NormalizedAnswer {
    let question = &exam_question.question;
    let question_type = question.question_type;

    let answer_content = match value {
        None => JsonValue::Null,
        Some(value) if !value.matches(question_type) => {
            warn!(
                "⚠️ 题目 {} 的作答形态与题型 {} 不符，按未作答处理",
                exam_question.id,
                question_type.code()
            );
            JsonValue::Null
        }
        Some(value) => normalize_content(question, value),
    };

    NormalizedAnswer {
        question_id: exam_question.id.clone(),
        question_type,
        order_index,
        answer_content,
    }
}

/// 按题型转换作答内容
fn normalize_content(question: &Question, value: &AnswerValue) -> JsonValue {
    match value {
        // 这四种题型的作答值原样提交
        AnswerValue::Single(choice) => json!(choice),
        AnswerValue::Multiple(choices) => json!(choices),
        AnswerValue::DragDrop(zones) => json!(zones),
        AnswerValue::Ordering(orders) => json!(orders),
        AnswerValue::Matching(pairs) => normalize_matching(question, pairs),
        AnswerValue::VideoPopup(popups) => normalize_video_popup(question, popups),
    }
}

/// 连线题：把 (左ID, 右ID) 反查为左右两侧的语义内容
///
/// 任一侧反查失败（选项已删除或ID不匹配）时丢弃该对，
/// 其余照常产出。对同一份作答重复归一化，结果逐项一致
fn normalize_matching(
    question: &Question,
    pairs: &std::collections::BTreeMap<String, String>,
) -> JsonValue {
    let resolved: Vec<JsonValue> = pairs
        .iter()
        .filter_map(|(left_id, right_id)| {
            let left = question.find_answer(left_id)?;
            let right = question.find_answer(right_id)?;
            Some(json!({
                "left": left.content,
                "right": right.content,
            }))
        })
        .collect();

    JsonValue::Array(resolved)
}

/// 视频弹题：把弹出点序号反查为弹出点的稳定ID
///
/// 产出 `弹出点ID -> 选中值` 的映射；未作答的弹出点不出现，
/// 序号越界或无法解析的条目丢弃
fn normalize_video_popup(
    question: &Question,
    popups: &std::collections::BTreeMap<String, crate::models::PopupAnswer>,
) -> JsonValue {
    let popup_times = question
        .answer_config
        .as_ref()
        .map(|config| config.popup_times())
        .unwrap_or(&[]);

    let mut resolved = serde_json::Map::new();
    for (index_text, popup_answer) in popups {
        let Ok(index) = index_text.parse::<usize>() else {
            continue;
        };
        let Some(popup_time) = popup_times.get(index) else {
            continue;
        };
        resolved.insert(
            popup_time.id.clone(),
            json!(popup_answer.content.value),
        );
    }

    JsonValue::Object(resolved)
}
