//! 작업 정보 모델.

use serde::{Deserialize, Serialize};

/// 작업 난이도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    /// 소요 시간(분)으로 난이도 추정
    pub fn from_duration(minutes: f64) -> Self {
        if minutes <= 5.0 {
            Self::Low
        } else if minutes <= 10.0 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// 페이지에서 추출한 작업 속성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    /// 작업 유형 (소문자, 예: "search", "side_by_side")
    pub task_type: String,
    /// 예상 소요 시간 (분)
    pub duration_minutes: f64,
    /// 보상 (달러)
    pub reward_dollars: f64,
    /// 난이도
    pub complexity: Complexity,
}
