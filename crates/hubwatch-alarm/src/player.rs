//! 알람 플레이어.
//!
//! `Alarm` 포트 구현. 음원은 아래 순서로 시도하며 처음 성공한 단계에서 멈춘다.
//!
//! 1. 사용자 지정 음원 — 파일(data URI/경로) 또는 URL
//! 2. 내장 기본음 (합성 차임)
//! 3. 합성 비프음
//! 4. 무음 (로그만 남김)
//!
//! 동시에 울리는 알람은 최대 하나. 새 알람은 기존 알람을 먼저 멈춘다.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hubwatch_core::config::{AlertSound, SoundKind};
use hubwatch_core::error::CoreError;
use hubwatch_core::ports::alarm::{Alarm, AlarmNotice, AlarmOutcome, AlarmRequest};
use hubwatch_core::ports::audio::{AudioOutput, AudioSource, SoundFetcher};
use hubwatch_core::ports::notifier::{DesktopNotifier, NotificationPermission};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::tone;

/// 알람 플레이어
pub struct AlarmPlayer {
    output: Arc<dyn AudioOutput>,
    fetcher: Option<Arc<dyn SoundFetcher>>,
    notifier: Option<Arc<dyn DesktopNotifier>>,
    active: AtomicBool,
}

impl AlarmPlayer {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            output,
            fetcher: None,
            notifier: None,
            active: AtomicBool::new(false),
        }
    }

    /// URL 음원 다운로드기 지정
    pub fn with_fetcher(mut self, fetcher: Arc<dyn SoundFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// 데스크톱 알림 지정
    pub fn with_notifier(mut self, notifier: Arc<dyn DesktopNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// 출력 이름
    pub fn output_name(&self) -> &str {
        self.output.name()
    }

    /// 사용자 지정 음원 로드. 기본음 설정이면 `Ok(None)`.
    async fn load_custom(&self, sound: &AlertSound) -> Result<Option<AudioSource>, CoreError> {
        let data = sound.data.trim();
        let bytes = match sound.kind {
            SoundKind::Default => return Ok(None),
            _ if data.is_empty() => {
                debug!(kind = ?sound.kind, "사용자 음원 데이터 없음 — 기본음 사용");
                return Ok(None);
            }
            SoundKind::File => load_file_sound(data).await?,
            SoundKind::Url => match &self.fetcher {
                Some(fetcher) => fetcher.fetch(data).await?,
                None => {
                    return Err(CoreError::Unsupported(
                        "URL 음원 다운로드기가 설정되지 않음".to_string(),
                    ))
                }
            },
        };
        let label = match sound.kind {
            SoundKind::Url => "custom-url",
            _ => "custom-file",
        };
        Ok(Some(AudioSource::Encoded {
            label: label.to_string(),
            bytes,
        }))
    }

    async fn play_chain(&self, request: &AlarmRequest) -> AlarmOutcome {
        match self.load_custom(&request.sound).await {
            Ok(Some(source)) => match self.output.play(&source, &request.options).await {
                Ok(()) => return AlarmOutcome::Custom,
                Err(e) => warn!("사용자 지정 음원 재생 실패, 기본음으로 대체: {e}"),
            },
            Ok(None) => {}
            Err(e) => warn!("사용자 지정 음원 로드 실패, 기본음으로 대체: {e}"),
        }

        let chime = AudioSource::Encoded {
            label: "bundled-default".to_string(),
            bytes: tone::bundled_chime(),
        };
        match self.output.play(&chime, &request.options).await {
            Ok(()) => return AlarmOutcome::Default,
            Err(e) => warn!("기본음 재생 실패, 비프음으로 대체: {e}"),
        }

        let beep = AudioSource::Tone {
            frequency_hz: request.tone.frequency_hz,
            duration_ms: request.tone.duration_ms,
        };
        match self.output.play(&beep, &request.options).await {
            Ok(()) => AlarmOutcome::Tone,
            Err(e) => {
                warn!("비프음 재생 실패 — 알람 무음: {e}");
                AlarmOutcome::Silent
            }
        }
    }

    /// 권한 확인 후 데스크톱 알림 표시
    async fn notify(&self, notice: &AlarmNotice) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        let mut permission = notifier.permission().await;
        if permission == NotificationPermission::Default {
            permission = notifier.request_permission().await;
        }
        if permission != NotificationPermission::Granted {
            debug!(?permission, "알림 권한 없음 — 데스크톱 알림 생략");
            return;
        }

        if let Err(e) = notifier.show_notification(&notice.title, &notice.body).await {
            warn!("데스크톱 알림 표시 실패: {e}");
        }
    }
}

#[async_trait]
impl Alarm for AlarmPlayer {
    async fn raise(&self, request: &AlarmRequest) -> AlarmOutcome {
        self.silence().await;

        let outcome = self.play_chain(request).await;
        self.active
            .store(outcome != AlarmOutcome::Silent, Ordering::SeqCst);
        info!(?outcome, output = self.output.name(), "알람 시작");

        if let Some(notice) = &request.notice {
            self.notify(notice).await;
        }
        outcome
    }

    async fn silence(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            debug!("진행 중인 알람 중지");
        }
        self.output.stop().await;
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// 파일 음원: `data:` URI(base64)이면 디코딩, 아니면 로컬 경로로 읽음
async fn load_file_sound(data: &str) -> Result<Vec<u8>, CoreError> {
    if let Some(rest) = data.strip_prefix("data:") {
        return decode_data_uri(rest);
    }
    Ok(tokio::fs::read(data).await?)
}

/// `data:` 뒤 부분 디코딩 (`<mime>;base64,<payload>`)
fn decode_data_uri(rest: &str) -> Result<Vec<u8>, CoreError> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::validation("alert_sound.data", "data URI에 ','가 없음"))?;
    if !meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        return Err(CoreError::Unsupported(
            "base64가 아닌 data URI는 지원하지 않음".to_string(),
        ));
    }
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| CoreError::validation("alert_sound.data", format!("base64 디코딩 실패: {e}")))
}
