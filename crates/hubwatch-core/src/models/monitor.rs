//! 모니터 상태 모델.

use serde::{Deserialize, Serialize};

/// 모니터 제어기 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    /// 정지 (타이머 없음)
    #[default]
    Stopped,
    /// 주기적 페이지 확인 중
    Polling,
    /// 미완료 작업 안내에 대한 사용자 응답 대기
    AwaitingUserDecision,
}

impl std::fmt::Display for MonitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Stopped => "stopped",
            Self::Polling => "polling",
            Self::AwaitingUserDecision => "awaiting_user_decision",
        };
        f.write_str(label)
    }
}
