//! 사용자 확인 포트.
//!
//! 구현: `hubwatch-app` crate (터미널 프롬프트)

use async_trait::async_trait;

use crate::error::CoreError;

/// 사용자에게 보여줄 선택 안내
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionNotice {
    pub title: String,
    pub message: String,
}

/// 선택 안내 표시. 응답은 별도 경로(`MonitorController::user_decision`)로 도착한다.
#[async_trait]
pub trait DecisionPrompt: Send + Sync {
    async fn present(&self, notice: &DecisionNotice) -> Result<(), CoreError>;
}
