use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use exam_session::infrastructure::{ChannelHandle, OutboundEvent, PresenceStatus, WriterCommand};
use exam_session::models::{
    AnswerValue, ExamDefinition, ExamQuestion, Question, QuestionType, SubmissionPayload, TestType,
};
use exam_session::orchestrator::validate_identity;
use exam_session::services::{TimerEngine, VisibilityMonitor, VisibilitySignal};
use exam_session::workflow::{
    RouteTarget, SessionCell, SessionCtx, SessionNotice, SessionState, SubmissionApi, SubmitFlow,
    SubmitReason,
};

// ========== 测试辅助 ==========

/// 构造一张试卷
fn make_exam(question_count: usize, max_tab_switch: u32, test_type: TestType) -> ExamDefinition {
    ExamDefinition {
        id: "exam-1".to_string(),
        subject: "历史".to_string(),
        title: "单元测验".to_string(),
        exam_questions: (1..=question_count)
            .map(|i| ExamQuestion {
                id: format!("q{}", i),
                question: Question {
                    question_type: QuestionType::SingleChoice,
                    content: format!("<p>第{}题</p>", i),
                    answers: vec![],
                    answer_config: None,
                },
            })
            .collect(),
        duration_minutes: 10,
        max_tab_switch,
        test_type,
        allow_review: false,
        allow_review_point: false,
    }
}

/// 构造会话上下文
fn make_ctx() -> Arc<SessionCtx> {
    Arc::new(SessionCtx {
        exam_id: "exam-1".to_string(),
        study_group_id: "group-1".to_string(),
        student_id: "student-1".to_string(),
        student_name: "张三".to_string(),
        student_code: "2023001".to_string(),
        student_avatar: String::new(),
    })
}

/// 只计数的提交桩
#[derive(Clone)]
struct CountingApi {
    calls: Arc<AtomicUsize>,
}

impl SubmissionApi for CountingApi {
    fn submit_attempt(
        &self,
        _attempt_id: &str,
        _payload: &SubmissionPayload,
    ) -> impl Future<Output = anyhow::Result<()>> + Send {
        let calls = self.calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}

/// 记录请求体的提交桩
#[derive(Clone)]
struct RecordingApi {
    payloads: Arc<Mutex<Vec<SubmissionPayload>>>,
}

impl SubmissionApi for RecordingApi {
    fn submit_attempt(
        &self,
        _attempt_id: &str,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = anyhow::Result<()>> + Send {
        let payloads = self.payloads.clone();
        let payload = payload.clone();
        async move {
            payloads.lock().unwrap().push(payload);
            Ok(())
        }
    }
}

/// 必定失败的提交桩
struct FailingApi;

impl SubmissionApi for FailingApi {
    fn submit_attempt(
        &self,
        _attempt_id: &str,
        _payload: &SubmissionPayload,
    ) -> impl Future<Output = anyhow::Result<()>> + Send {
        async move { Err(anyhow::anyhow!("服务端不可用")) }
    }
}

/// 组装一个交卷流程
fn make_flow<S: SubmissionApi>(
    exam: &ExamDefinition,
    session: SessionCell,
    api: S,
) -> (
    SubmitFlow<S>,
    mpsc::UnboundedReceiver<WriterCommand>,
    mpsc::UnboundedReceiver<SessionNotice>,
) {
    let (handle, commands_rx) = ChannelHandle::detached(make_ctx());
    let (notices_tx, notices_rx) = mpsc::unbounded_channel();
    let flow = SubmitFlow::new(
        session,
        Arc::new(exam.clone()),
        "attempt-1".to_string(),
        api,
        handle,
        notices_tx,
    );
    (flow, commands_rx, notices_rx)
}

// ========== 提交锁存 ==========

#[tokio::test]
async fn test_at_most_once_submission_under_race() {
    // 三路终止信号同时到达，只有一路真正提交
    let exam = make_exam(2, 3, TestType::Exercise);
    let session = SessionCell::new(SessionState::new(&exam));
    let calls = Arc::new(AtomicUsize::new(0));
    let (flow, _commands_rx, _notices_rx) =
        make_flow(&exam, session, CountingApi { calls: calls.clone() });

    let (first, second, third) = tokio::join!(
        flow.run(SubmitReason::Timeout),
        flow.run(SubmitReason::TabSwitch),
        flow.run(SubmitReason::Manual),
    );

    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let winners = [first, second, third]
        .iter()
        .filter(|r| r.is_some())
        .count();
    assert_eq!(winners, 1);
}

#[test]
fn test_submit_latch_is_write_once() {
    let exam = make_exam(1, 3, TestType::Midterm);
    let mut state = SessionState::new(&exam);

    assert!(!state.is_submitted());
    assert!(state.try_begin_submit());
    assert!(state.is_submitted());
    assert!(!state.try_begin_submit());
    assert!(!state.try_begin_submit());
}

#[test]
fn test_answers_frozen_after_submit() {
    let exam = make_exam(1, 3, TestType::Midterm);
    let mut state = SessionState::new(&exam);
    assert!(state.try_begin_submit());

    state.record_answer("q1".to_string(), AnswerValue::Single("A".to_string()));
    assert_eq!(state.answered_count(), 0);
}

// ========== 切屏监视器 ==========

#[tokio::test]
async fn test_tab_switch_threshold_warns_then_fires_once() {
    // 上限3次：前两次只告警，第三次触发一次终止信号
    let exam = make_exam(1, 3, TestType::Exercise);
    let session = SessionCell::new(SessionState::new(&exam));
    let (handle, mut commands_rx) = ChannelHandle::detached(make_ctx());
    let (triggers_tx, mut triggers_rx) = mpsc::unbounded_channel();
    let (notices_tx, mut notices_rx) = mpsc::unbounded_channel();

    let mut monitor = VisibilityMonitor::new(
        session.clone(),
        handle,
        exam.max_tab_switch,
        triggers_tx,
        notices_tx,
    );

    for _ in 0..3 {
        monitor.on_signal(VisibilitySignal::Background);
        monitor.on_signal(VisibilitySignal::Foreground);
    }
    // 触发后继续切屏不再计数
    monitor.on_signal(VisibilitySignal::Background);

    assert_eq!(session.lock().tab_switch_count, 3);

    assert_eq!(
        notices_rx.try_recv().unwrap(),
        SessionNotice::TabSwitchWarning { count: 1, max: 3 }
    );
    assert_eq!(
        notices_rx.try_recv().unwrap(),
        SessionNotice::TabSwitchWarning { count: 2, max: 3 }
    );
    assert!(notices_rx.try_recv().is_err());

    assert_eq!(triggers_rx.try_recv().unwrap(), SubmitReason::TabSwitch);
    assert!(triggers_rx.try_recv().is_err());

    // 上报顺序：tabOut 在计数之前，tabIn 携带作答中状态
    assert_eq!(
        commands_rx.try_recv().unwrap(),
        WriterCommand::Emit(OutboundEvent::TabOut)
    );
    assert_eq!(
        commands_rx.try_recv().unwrap(),
        WriterCommand::Emit(OutboundEvent::TabIn {
            status: PresenceStatus::TakingExam
        })
    );
}

#[tokio::test]
async fn test_no_tab_counting_before_open() {
    // 开考前的切换不计数，切回仍上报等待状态
    let exam = make_exam(1, 3, TestType::Midterm);
    let session = SessionCell::new(SessionState::new(&exam));
    let (handle, mut commands_rx) = ChannelHandle::detached(make_ctx());
    let (triggers_tx, mut triggers_rx) = mpsc::unbounded_channel();
    let (notices_tx, mut notices_rx) = mpsc::unbounded_channel();

    let mut monitor = VisibilityMonitor::new(
        session.clone(),
        handle,
        exam.max_tab_switch,
        triggers_tx,
        notices_tx,
    );

    monitor.on_signal(VisibilitySignal::Background);
    monitor.on_signal(VisibilitySignal::Foreground);

    assert_eq!(session.lock().tab_switch_count, 0);
    assert!(triggers_rx.try_recv().is_err());
    assert!(notices_rx.try_recv().is_err());

    assert_eq!(
        commands_rx.try_recv().unwrap(),
        WriterCommand::Emit(OutboundEvent::TabIn {
            status: PresenceStatus::Waiting
        })
    );
}

#[tokio::test]
async fn test_monitor_inert_after_submit() {
    let exam = make_exam(1, 1, TestType::Exercise);
    let session = SessionCell::new(SessionState::new(&exam));
    assert!(session.try_begin_submit());

    let (handle, mut commands_rx) = ChannelHandle::detached(make_ctx());
    let (triggers_tx, mut triggers_rx) = mpsc::unbounded_channel();
    let (notices_tx, _notices_rx) = mpsc::unbounded_channel();

    let mut monitor =
        VisibilityMonitor::new(session.clone(), handle, 1, triggers_tx, notices_tx);

    monitor.on_signal(VisibilitySignal::Background);

    assert_eq!(session.lock().tab_switch_count, 0);
    assert!(triggers_rx.try_recv().is_err());
    assert!(commands_rx.try_recv().is_err());
}

// ========== 倒计时引擎 ==========

#[tokio::test(start_paused = true)]
async fn test_timer_gated_until_open() {
    // 闸门关闭期间剩余时间纹丝不动，打开后开始递减
    let exam = make_exam(1, 3, TestType::Midterm);
    let session = SessionCell::new(SessionState::new(&exam));
    let (triggers_tx, _triggers_rx) = mpsc::unbounded_channel();

    let timer = TimerEngine::new(session.clone(), triggers_tx).spawn();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(session.lock().time_left_seconds, 600);

    session.lock().exam_opened = true;
    tokio::time::sleep(Duration::from_secs(5)).await;

    let left = session.lock().time_left_seconds;
    assert!(
        (595..=596).contains(&left),
        "开放5秒后剩余时间应当减少约5秒，实际 {}",
        left
    );

    timer.abort();
}

#[tokio::test(start_paused = true)]
async fn test_timer_reaches_zero_and_fires_timeout() {
    let exam = make_exam(1, 3, TestType::Exercise);
    let session = SessionCell::new(SessionState::new(&exam));
    session.lock().time_left_seconds = 3;

    let (triggers_tx, mut triggers_rx) = mpsc::unbounded_channel();
    let _timer = TimerEngine::new(session.clone(), triggers_tx).spawn();

    let reason = triggers_rx.recv().await.unwrap();
    assert_eq!(reason, SubmitReason::Timeout);
    assert_eq!(session.lock().time_left_seconds, 0);

    // 归零后不再有第二个信号
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(triggers_rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_timer_stops_after_submit() {
    let exam = make_exam(1, 3, TestType::Exercise);
    let session = SessionCell::new(SessionState::new(&exam));

    let (triggers_tx, mut triggers_rx) = mpsc::unbounded_channel();
    let _timer = TimerEngine::new(session.clone(), triggers_tx).spawn();

    tokio::time::sleep(Duration::from_secs(3)).await;
    let before = session.lock().time_left_seconds;
    assert!(before < 600);

    assert!(session.try_begin_submit());
    tokio::time::sleep(Duration::from_secs(5)).await;

    // 锁存置位后停表
    let after = session.lock().time_left_seconds;
    assert!(after >= before.saturating_sub(1));
    assert!(triggers_rx.try_recv().is_err());
}

// ========== 会话状态 ==========

#[test]
fn test_exercise_is_pre_opened() {
    let exercise = make_exam(1, 3, TestType::Exercise);
    assert!(SessionState::new(&exercise).exam_opened);

    let midterm = make_exam(1, 3, TestType::Midterm);
    assert!(!SessionState::new(&midterm).exam_opened);
}

#[test]
fn test_goto_question_clamps_to_bounds() {
    let exam = make_exam(3, 3, TestType::Exercise);
    let mut state = SessionState::new(&exam);

    state.goto_question(99);
    assert_eq!(state.current_question_index, 2);

    state.goto_question(1);
    assert_eq!(state.current_question_index, 1);
}

#[test]
fn test_validate_identity_rejects_missing_fields() {
    let mut ctx = SessionCtx {
        exam_id: "exam-1".to_string(),
        study_group_id: "group-1".to_string(),
        student_id: "student-1".to_string(),
        student_name: String::new(),
        student_code: String::new(),
        student_avatar: String::new(),
    };
    assert!(validate_identity(&ctx).is_ok());

    ctx.study_group_id.clear();
    assert!(validate_identity(&ctx).is_err());
}

// ========== 端到端场景 ==========

#[tokio::test]
async fn test_scenario_single_tab_switch_submits_immediately() {
    // 时长10分钟、切屏上限1次：答完第一题后切出一次，立即交卷
    let exam = make_exam(3, 1, TestType::Exercise);
    let session = SessionCell::new(SessionState::new(&exam));

    session
        .lock()
        .record_answer("q1".to_string(), AnswerValue::Single("A".to_string()));

    let payloads = Arc::new(Mutex::new(Vec::new()));
    let (flow, mut commands_rx, _notices_rx) = make_flow(
        &exam,
        session.clone(),
        RecordingApi {
            payloads: payloads.clone(),
        },
    );

    let (handle, _monitor_commands_rx) = ChannelHandle::detached(make_ctx());
    let (triggers_tx, mut triggers_rx) = mpsc::unbounded_channel();
    let (notices_tx, _notices_rx2) = mpsc::unbounded_channel();
    let mut monitor =
        VisibilityMonitor::new(session.clone(), handle, 1, triggers_tx, notices_tx);

    monitor.on_signal(VisibilitySignal::Background);

    let reason = triggers_rx.recv().await.unwrap();
    assert_eq!(reason, SubmitReason::TabSwitch);

    let route = flow.run(reason).await;
    assert_eq!(route, Some(RouteTarget::ExamList));

    let payloads = payloads.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    let payload = &payloads[0];

    assert_eq!(payload.tab_switches, 1);
    assert_eq!(payload.answers.len(), 3);
    assert_eq!(payload.answers[0].question_id, "q1");
    assert_eq!(payload.answers[0].answer_content, json!("A"));
    assert!(payload.answers[1].answer_content.is_null());
    assert!(payload.answers[2].answer_content.is_null());

    // 交卷前先通知监考房间
    assert_eq!(
        commands_rx.try_recv().unwrap(),
        WriterCommand::Emit(OutboundEvent::SubmitExam)
    );
}

#[tokio::test]
async fn test_scenario_timeout_with_no_answers() {
    // 倒计时归零、一题未答：time_spent 等于全部时长，条目全为 null
    let exam = make_exam(2, 3, TestType::Exercise);
    let session = SessionCell::new(SessionState::new(&exam));
    session.lock().time_left_seconds = 0;

    let payloads = Arc::new(Mutex::new(Vec::new()));
    let (flow, _commands_rx, _notices_rx) = make_flow(
        &exam,
        session,
        RecordingApi {
            payloads: payloads.clone(),
        },
    );

    let route = flow.run(SubmitReason::Timeout).await;
    assert_eq!(route, Some(RouteTarget::ExamList));

    let payloads = payloads.lock().unwrap();
    let payload = &payloads[0];
    assert_eq!(payload.time_spent, 600);
    assert!(payload.answers.iter().all(|a| a.answer_content.is_null()));
}

#[tokio::test]
async fn test_submit_failure_still_routes_away() {
    let exam = make_exam(1, 3, TestType::Exercise);
    let session = SessionCell::new(SessionState::new(&exam));

    let (flow, _commands_rx, mut notices_rx) = make_flow(&exam, session.clone(), FailingApi);

    let route = flow.run(SubmitReason::Manual).await;
    assert_eq!(route, Some(RouteTarget::ExamList));

    // 锁存保持置位，不会再次提交
    assert!(session.is_submitted());
    assert!(matches!(
        notices_rx.try_recv().unwrap(),
        SessionNotice::SubmitFailed(_)
    ));
}

#[tokio::test]
async fn test_review_point_routes_to_results() {
    let mut exam = make_exam(1, 3, TestType::Exercise);
    exam.allow_review_point = true;
    let session = SessionCell::new(SessionState::new(&exam));

    let calls = Arc::new(AtomicUsize::new(0));
    let (flow, _commands_rx, _notices_rx) = make_flow(&exam, session, CountingApi { calls });

    let route = flow.run(SubmitReason::Manual).await;
    assert_eq!(route, Some(RouteTarget::Results));
}

// ========== 通道拆除顺序 ==========

#[tokio::test]
async fn test_leave_precedes_disconnect_in_command_queue() {
    let (handle, mut commands_rx) = ChannelHandle::detached(make_ctx());

    handle.emit(OutboundEvent::LeaveExam);
    handle.disconnect();

    assert_eq!(
        commands_rx.try_recv().unwrap(),
        WriterCommand::Emit(OutboundEvent::LeaveExam)
    );
    assert_eq!(commands_rx.try_recv().unwrap(), WriterCommand::Disconnect);
}
