//! hubwatch 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 라이브러리 에러를 `map_err`로 `CoreError`에 매핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 유효성 검증, 페이지/오디오/알림 어댑터 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 페이지 요소를 찾을 수 없음
    #[error("페이지 요소 미발견: {0}")]
    ElementNotFound(String),

    /// 어댑터가 지원하지 않는 동작
    #[error("지원하지 않는 동작: {0}")]
    Unsupported(String),

    /// 오디오 재생 실패
    #[error("재생 실패: {0}")]
    Playback(String),

    /// 권한 거부 (데스크톱 알림 등)
    #[error("권한 거부: {0}")]
    PermissionDenied(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 필드 검증 에러 생성 헬퍼
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
