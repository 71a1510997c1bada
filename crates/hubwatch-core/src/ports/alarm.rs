//! 알람 포트.
//!
//! 구현: `hubwatch-alarm` crate (`AlarmPlayer`)

use async_trait::async_trait;

use crate::config::{AlarmConfig, AlertSound};
use crate::ports::audio::PlaybackOptions;

/// 알람과 함께 표시할 데스크톱 알림 문구
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmNotice {
    pub title: String,
    pub body: String,
}

/// 최후 수단 비프음 파라미터
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub duration_ms: u64,
}

impl From<&AlarmConfig> for ToneSpec {
    fn from(config: &AlarmConfig) -> Self {
        Self {
            frequency_hz: config.tone_frequency_hz,
            duration_ms: config.tone_duration_ms,
        }
    }
}

impl Default for ToneSpec {
    fn default() -> Self {
        Self::from(&AlarmConfig::default())
    }
}

/// 알람 요청
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmRequest {
    pub sound: AlertSound,
    pub options: PlaybackOptions,
    pub tone: ToneSpec,
    /// None이면 데스크톱 알림 없음
    pub notice: Option<AlarmNotice>,
}

/// 실제로 재생된 음원 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmOutcome {
    /// 사용자 지정 음원 (파일/URL)
    Custom,
    /// 내장 기본음
    Default,
    /// 합성 비프음
    Tone,
    /// 모든 단계 실패 (로그만 남김)
    Silent,
}

/// 알람 인터페이스. 실패는 결과값으로만 보고하고 호출자에게 전파하지 않는다.
#[async_trait]
pub trait Alarm: Send + Sync {
    /// 알람 시작. 진행 중인 알람은 먼저 중지된다.
    async fn raise(&self, request: &AlarmRequest) -> AlarmOutcome;

    /// 진행 중인 알람 중지
    async fn silence(&self);

    /// 알람이 진행 중인지
    fn is_active(&self) -> bool;
}
