//! 会话上下文
//!
//! 封装"谁在哪个小组考哪张卷子"这一信息

use std::fmt::Display;

/// 会话上下文
///
/// 包含一次考试会话所需的全部身份信息
#[derive(Debug, Clone)]
pub struct SessionCtx {
    /// 试卷ID
    pub exam_id: String,

    /// 学习小组ID
    pub study_group_id: String,

    /// 学生ID
    pub student_id: String,

    /// 学生姓名（进入房间时上报）
    pub student_name: String,

    /// 学号（进入房间时上报）
    pub student_code: String,

    /// 头像地址（进入房间时上报）
    pub student_avatar: String,
}

impl SessionCtx {
    /// 从配置创建会话上下文
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            exam_id: config.exam_id.clone(),
            study_group_id: config.study_group_id.clone(),
            student_id: config.student_id.clone(),
            student_name: config.student_name.clone(),
            student_code: config.student_code.clone(),
            student_avatar: config.student_avatar.clone(),
        }
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[卷子 ID#{} 小组#{} 学生#{}]",
            self.exam_id, self.study_group_id, self.student_id
        )
    }
}
