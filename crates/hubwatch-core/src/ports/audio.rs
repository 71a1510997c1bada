//! 오디오 출력 포트.
//!
//! 구현: `hubwatch-alarm` crate (터미널 벨, rodio)

use async_trait::async_trait;

use crate::error::CoreError;

/// 재생할 음원
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// 인코딩된 오디오 데이터 (WAV, MP3, OGG ...)
    Encoded {
        /// 로깅용 이름 (예: "custom-file", "bundled-default")
        label: String,
        bytes: Vec<u8>,
    },
    /// 발진기로 합성하는 단순 비프음
    Tone { frequency_hz: f32, duration_ms: u64 },
}

impl AudioSource {
    /// 로깅용 이름
    pub fn label(&self) -> &str {
        match self {
            Self::Encoded { label, .. } => label,
            Self::Tone { .. } => "tone",
        }
    }
}

/// 재생 옵션
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackOptions {
    /// 볼륨 (0.0 ~ 1.0)
    pub volume: f32,
    /// 중지될 때까지 반복
    pub looped: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            volume: 0.8,
            looped: false,
        }
    }
}

/// 오디오 출력 장치
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// 음원 재생 시작. 디코딩/장치 오류 시 `CoreError::Playback`.
    async fn play(&self, source: &AudioSource, options: &PlaybackOptions) -> Result<(), CoreError>;

    /// 재생 중인 음원 중지
    async fn stop(&self);

    /// 출력 이름 (예: "bell", "rodio")
    fn name(&self) -> &str;
}

/// 원격 음원 다운로드
///
/// 구현: `hubwatch-network` crate (reqwest)
#[async_trait]
pub trait SoundFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError>;
}
