//! 考试 API 客户端
//!
//! 封装所有与考试服务端相关的 HTTP 调用：拉取试卷、换取场次、提交评分。
//! 服务端响应统一包在 `{code, message, data}` 信封里，code 200 为成功

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::{AttemptInfo, ExamDefinition, SubmissionPayload};
use crate::workflow::SubmissionApi;

/// 考试 API 客户端
pub struct ExamClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

/// 服务端响应信封
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: u64,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

impl ExamClient {
    /// 创建新的考试客户端
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.exam_api_base_url.clone(),
            token: config.exam_api_token.clone(),
        }
    }

    /// 拉取试卷定义
    ///
    /// # 参数
    /// - `exam_id`: 试卷ID
    ///
    /// # 返回
    /// 返回完整的试卷定义（会话期间不再变更）
    pub async fn fetch_exam(&self, exam_id: &str) -> AppResult<ExamDefinition> {
        let endpoint = format!("{}/api/exam/{}", self.base_url, exam_id);
        debug!("拉取试卷: {}", endpoint);

        let response = self
            .http
            .get(&endpoint)
            .header("token", &self.token)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        self.parse_envelope(&endpoint, response).await
    }

    /// 换取考试场次
    ///
    /// # 参数
    /// - `exam_id`: 试卷ID
    /// - `study_group_id`: 学习小组ID
    /// - `student_id`: 学生ID
    ///
    /// # 返回
    /// 返回场次ID和当前作答状态
    pub async fn resolve_attempt(
        &self,
        exam_id: &str,
        study_group_id: &str,
        student_id: &str,
    ) -> AppResult<AttemptInfo> {
        let endpoint = format!("{}/api/exam/{}/attempt", self.base_url, exam_id);
        debug!("换取场次: {}", endpoint);

        let body = json!({
            "study_group_id": study_group_id,
            "student_id": student_id,
        });

        let response = self
            .http
            .post(&endpoint)
            .header("token", &self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        self.parse_envelope(&endpoint, response).await
    }

    /// 提交整卷作答
    ///
    /// # 参数
    /// - `attempt_id`: 场次ID
    /// - `payload`: 归一化后的交卷请求体
    pub async fn submit(&self, attempt_id: &str, payload: &SubmissionPayload) -> AppResult<()> {
        let endpoint = format!("{}/api/attempt/{}/submit", self.base_url, attempt_id);
        debug!(
            "提交评分: {} (条目 {} / 用时 {}秒)",
            endpoint,
            payload.answers.len(),
            payload.time_spent
        );

        let response = self
            .http
            .post(&endpoint)
            .header("token", &self.token)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        // 提交接口的 data 为空，只校验信封
        let envelope: ApiEnvelope<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        if envelope.code != 200 {
            return Err(AppError::Api(ApiError::BadResponse {
                endpoint,
                code: Some(envelope.code),
                message: envelope.message,
            }));
        }

        Ok(())
    }

    /// 解析响应信封并取出 data
    async fn parse_envelope<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        if envelope.code != 200 {
            return Err(AppError::Api(ApiError::BadResponse {
                endpoint: endpoint.to_string(),
                code: Some(envelope.code),
                message: envelope.message,
            }));
        }

        envelope.data.ok_or_else(|| {
            AppError::Api(ApiError::EmptyResponse {
                endpoint: endpoint.to_string(),
            })
        })
    }
}

impl SubmissionApi for ExamClient {
    fn submit_attempt(
        &self,
        attempt_id: &str,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = anyhow::Result<()>> + Send {
        async move { self.submit(attempt_id, payload).await.map_err(Into::into) }
    }
}
