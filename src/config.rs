/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 考试 API 基础地址
    pub exam_api_base_url: String,
    /// 考试 API 访问令牌
    pub exam_api_token: String,
    /// 实时通道地址
    pub realtime_url: String,
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
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exam_api_base_url: "https://exam-api.lpzx.xdf.cn".to_string(),
            exam_api_token: String::new(),
            realtime_url: "wss://exam-rt.lpzx.xdf.cn/socket".to_string(),
            exam_id: String::new(),
            study_group_id: String::new(),
            student_id: String::new(),
            student_name: String::new(),
            student_code: String::new(),
            student_avatar: String::new(),
            verbose_logging: false,
            output_log_file: "session.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            exam_api_base_url: std::env::var("EXAM_API_BASE_URL").unwrap_or(default.exam_api_base_url),
            exam_api_token: std::env::var("EXAM_API_TOKEN").unwrap_or(default.exam_api_token),
            realtime_url: std::env::var("REALTIME_URL").unwrap_or(default.realtime_url),
            exam_id: std::env::var("EXAM_ID").unwrap_or(default.exam_id),
            study_group_id: std::env::var("STUDY_GROUP_ID").unwrap_or(default.study_group_id),
            student_id: std::env::var("STUDENT_ID").unwrap_or(default.student_id),
            student_name: std::env::var("STUDENT_NAME").unwrap_or(default.student_name),
            student_code: std::env::var("STUDENT_CODE").unwrap_or(default.student_code),
            student_avatar: std::env::var("STUDENT_AVATAR").unwrap_or(default.student_avatar),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }
}
