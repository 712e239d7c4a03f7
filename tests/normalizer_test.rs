use std::collections::{BTreeMap, HashMap};

use serde_json::json;

use exam_session::models::{
    AnswerConfig, AnswerOption, AnswerValue, ExamDefinition, ExamQuestion, PopupAnswer,
    PopupChoice, PopupTime, Question, QuestionType, TestType,
};
use exam_session::services::normalizer;

/// 构造一道题
fn make_question(question_type: QuestionType, answers: Vec<AnswerOption>) -> Question {
    Question {
        question_type,
        content: "<p>题干</p>".to_string(),
        answers,
        answer_config: None,
    }
}

/// 构造一个选项
fn make_option(id: &str, content: serde_json::Value) -> AnswerOption {
    AnswerOption {
        id: id.to_string(),
        content,
        order: None,
    }
}

/// 构造一张试卷
fn make_exam(questions: Vec<(&str, Question)>) -> ExamDefinition {
    ExamDefinition {
        id: "exam-1".to_string(),
        subject: "历史".to_string(),
        title: "单元测验".to_string(),
        exam_questions: questions
            .into_iter()
            .map(|(id, question)| ExamQuestion {
                id: id.to_string(),
                question,
            })
            .collect(),
        duration_minutes: 10,
        max_tab_switch: 3,
        test_type: TestType::Midterm,
        allow_review: false,
        allow_review_point: false,
    }
}

#[test]
fn test_unanswered_questions_still_present() {
    // 三道题只答一道，提交条目仍然是三条，未答的内容为 null
    let exam = make_exam(vec![
        ("q1", make_question(QuestionType::SingleChoice, vec![])),
        ("q2", make_question(QuestionType::MultipleSelect, vec![])),
        ("q3", make_question(QuestionType::SingleChoice, vec![])),
    ]);

    let mut answers = HashMap::new();
    answers.insert("q2".to_string(), AnswerValue::Multiple(vec!["B".to_string()]));

    let normalized = normalizer::normalize_all(&exam, &answers);

    assert_eq!(normalized.len(), 3);
    assert_eq!(normalized[0].question_id, "q1");
    assert!(normalized[0].answer_content.is_null());
    assert_eq!(normalized[1].answer_content, json!(["B"]));
    assert!(normalized[2].answer_content.is_null());

    // 序号从1开始，顺序与试卷一致
    let order: Vec<u32> = normalized.iter().map(|a| a.order_index).collect();
    assert_eq!(order, vec![1, 2, 3]);
}

#[test]
fn test_verbatim_types_pass_through() {
    let exam = make_exam(vec![
        ("q1", make_question(QuestionType::SingleChoice, vec![])),
        ("q2", make_question(QuestionType::DragDrop, vec![])),
        ("q3", make_question(QuestionType::Ordering, vec![])),
    ]);

    let mut drag = BTreeMap::new();
    drag.insert("zone-a".to_string(), vec!["x".to_string(), "y".to_string()]);
    let mut ordering = BTreeMap::new();
    ordering.insert("item-1".to_string(), 2u32);
    ordering.insert("item-2".to_string(), 1u32);

    let mut answers = HashMap::new();
    answers.insert("q1".to_string(), AnswerValue::Single("A".to_string()));
    answers.insert("q2".to_string(), AnswerValue::DragDrop(drag));
    answers.insert("q3".to_string(), AnswerValue::Ordering(ordering));

    let normalized = normalizer::normalize_all(&exam, &answers);

    assert_eq!(normalized[0].answer_content, json!("A"));
    assert_eq!(normalized[1].answer_content, json!({"zone-a": ["x", "y"]}));
    assert_eq!(normalized[2].answer_content, json!({"item-1": 2, "item-2": 1}));
}

#[test]
fn test_matching_resolves_ids_to_content() {
    let question = make_question(
        QuestionType::Matching,
        vec![
            make_option("l1", json!("唐朝")),
            make_option("l2", json!("宋朝")),
            make_option("r1", json!("618年")),
            make_option("r2", json!("960年")),
        ],
    );
    let exam = make_exam(vec![("q1", question)]);

    let mut pairs = BTreeMap::new();
    pairs.insert("l1".to_string(), "r1".to_string());
    pairs.insert("l2".to_string(), "r2".to_string());

    let mut answers = HashMap::new();
    answers.insert("q1".to_string(), AnswerValue::Matching(pairs));

    let normalized = normalizer::normalize_all(&exam, &answers);

    assert_eq!(
        normalized[0].answer_content,
        json!([
            {"left": "唐朝", "right": "618年"},
            {"left": "宋朝", "right": "960年"},
        ])
    );
}

#[test]
fn test_matching_drops_unresolvable_pairs_silently() {
    let question = make_question(
        QuestionType::Matching,
        vec![
            make_option("l1", json!("唐朝")),
            make_option("r1", json!("618年")),
        ],
    );
    let exam = make_exam(vec![("q1", question)]);

    let mut pairs = BTreeMap::new();
    pairs.insert("l1".to_string(), "r1".to_string());
    // 右侧选项已删除
    pairs.insert("l2".to_string(), "r-deleted".to_string());

    let mut answers = HashMap::new();
    answers.insert("q1".to_string(), AnswerValue::Matching(pairs));

    let normalized = normalizer::normalize_all(&exam, &answers);

    assert_eq!(
        normalized[0].answer_content,
        json!([{"left": "唐朝", "right": "618年"}])
    );
}

#[test]
fn test_matching_normalization_is_idempotent() {
    let question = make_question(
        QuestionType::Matching,
        vec![
            make_option("l1", json!("甲")),
            make_option("l2", json!("乙")),
            make_option("r1", json!("一")),
            make_option("r2", json!("二")),
        ],
    );
    let exam = make_exam(vec![("q1", question)]);

    let mut pairs = BTreeMap::new();
    pairs.insert("l2".to_string(), "r1".to_string());
    pairs.insert("l1".to_string(), "r2".to_string());

    let mut answers = HashMap::new();
    answers.insert("q1".to_string(), AnswerValue::Matching(pairs));

    let first = normalizer::normalize_all(&exam, &answers);
    let second = normalizer::normalize_all(&exam, &answers);

    assert_eq!(first, second);
}

#[test]
fn test_video_popup_resolves_index_to_popup_id() {
    let mut question = make_question(QuestionType::VideoPopup, vec![]);
    question.answer_config = Some(AnswerConfig::VideoPopup {
        video_url: None,
        popup_times: vec![
            PopupTime {
                id: "popup-a".to_string(),
                time_seconds: 30.0,
                prompt: None,
            },
            PopupTime {
                id: "popup-b".to_string(),
                time_seconds: 90.0,
                prompt: None,
            },
        ],
    });
    let exam = make_exam(vec![("q1", question)]);

    let mut popups = BTreeMap::new();
    popups.insert(
        "0".to_string(),
        PopupAnswer {
            content: PopupChoice {
                value: "A".to_string(),
                text: "选项甲".to_string(),
            },
            order_index: 1,
        },
    );
    // 越界序号丢弃
    popups.insert(
        "5".to_string(),
        PopupAnswer {
            content: PopupChoice {
                value: "B".to_string(),
                text: "选项乙".to_string(),
            },
            order_index: 2,
        },
    );

    let mut answers = HashMap::new();
    answers.insert("q1".to_string(), AnswerValue::VideoPopup(popups));

    let normalized = normalizer::normalize_all(&exam, &answers);

    // 第二个弹出点未作答，不出现在映射里
    assert_eq!(normalized[0].answer_content, json!({"popup-a": "A"}));
}

#[test]
fn test_mismatched_answer_shape_treated_as_unanswered() {
    let exam = make_exam(vec![(
        "q1",
        make_question(QuestionType::SingleChoice, vec![]),
    )]);

    let mut answers = HashMap::new();
    // 单选题却记录了多选形态
    answers.insert(
        "q1".to_string(),
        AnswerValue::Multiple(vec!["A".to_string(), "B".to_string()]),
    );

    let normalized = normalizer::normalize_all(&exam, &answers);

    assert!(normalized[0].answer_content.is_null());
}

#[test]
fn test_answer_value_parses_from_json_shapes() {
    // 宿主命令行传入的 JSON 按形态落到对应变体
    let single: AnswerValue = serde_json::from_str(r#""A""#).unwrap();
    assert_eq!(single, AnswerValue::Single("A".to_string()));

    let multiple: AnswerValue = serde_json::from_str(r#"["A", "C"]"#).unwrap();
    assert_eq!(
        multiple,
        AnswerValue::Multiple(vec!["A".to_string(), "C".to_string()])
    );

    let ordering: AnswerValue = serde_json::from_str(r#"{"item-1": 2, "item-2": 1}"#).unwrap();
    assert!(matches!(ordering, AnswerValue::Ordering(_)));

    let drag: AnswerValue = serde_json::from_str(r#"{"zone-a": ["x"]}"#).unwrap();
    assert!(matches!(drag, AnswerValue::DragDrop(_)));

    let matching: AnswerValue = serde_json::from_str(r#"{"l1": "r1"}"#).unwrap();
    assert!(matches!(matching, AnswerValue::Matching(_)));
}
