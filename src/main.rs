use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use exam_session::orchestrator::App;
use exam_session::utils::logging;
use exam_session::{AnswerValue, Config, HostEvent, VisibilitySignal};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 引导闸门：无效会话（身份缺失 / 已提交 / 数据异常）提示后直接退出
    let app = match App::initialize(config).await {
        Ok(app) => app,
        Err(e) => {
            error!("🚫 无法进入考试: {:#}", e);
            return Ok(());
        }
    };

    // 宿主事件来自标准输入（嵌入界面时由外壳替换这一段）
    let (host_tx, host_rx) = mpsc::unbounded_channel();
    tokio::spawn(read_host_commands(host_tx));

    app.run(host_rx).await?;

    Ok(())
}

/// 从标准输入读取宿主命令
///
/// 支持的命令：
/// - `answer <题目ID> <JSON作答值>`
/// - `flag <题目ID>`
/// - `goto <题目序号>`
/// - `blur` / `focus`（模拟切出 / 切回页面）
/// - `submit`（请求交卷）、`yes`（确认）、`no`（取消）
async fn read_host_commands(host_tx: mpsc::UnboundedSender<HostEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        match parse_command(&line) {
            Ok(Some(event)) => {
                if host_tx.send(event).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(message) => warn!("⚠️ {}", message),
        }
    }
}

/// 解析一行宿主命令
///
/// # 返回
/// 空行和取消命令返回 Ok(None)；无法解析时返回提示文案
fn parse_command(line: &str) -> Result<Option<HostEvent>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    match command {
        "answer" => {
            let (question_id, value_text) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "用法: answer <题目ID> <JSON作答值>".to_string())?;
            let value: AnswerValue = serde_json::from_str(value_text.trim())
                .map_err(|e| format!("作答值解析失败: {}", e))?;
            Ok(Some(HostEvent::Answer {
                question_id: question_id.to_string(),
                value,
            }))
        }
        "flag" => {
            if rest.is_empty() {
                return Err("用法: flag <题目ID>".to_string());
            }
            Ok(Some(HostEvent::ToggleFlag(rest.to_string())))
        }
        "goto" => {
            let index: usize = rest
                .parse()
                .map_err(|_| "用法: goto <题目序号>".to_string())?;
            Ok(Some(HostEvent::Goto(index)))
        }
        "blur" => Ok(Some(HostEvent::Visibility(VisibilitySignal::Background))),
        "focus" => Ok(Some(HostEvent::Visibility(VisibilitySignal::Foreground))),
        "submit" => Ok(Some(HostEvent::RequestSubmit)),
        "yes" => Ok(Some(HostEvent::ConfirmSubmit)),
        "no" => {
            info!("已取消交卷");
            Ok(None)
        }
        other => Err(format!("无法识别的命令: {}", other)),
    }
}
