//! 文本工具
//!
//! 题干是富文本，日志预览前先去掉标签再截断

use std::sync::OnceLock;

use regex::Regex;

static HTML_TAG: OnceLock<Regex> = OnceLock::new();

/// 去除 HTML 标签
///
/// # 参数
/// - `text`: 原始富文本
///
/// # 返回
/// 返回纯文本内容
pub fn strip_html(text: &str) -> String {
    let pattern = HTML_TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("固定的正则必然合法"));
    pattern.replace_all(text, "").trim().to_string()
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
