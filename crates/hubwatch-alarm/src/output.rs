//! 오디오 출력 어댑터.
//!
//! - `TerminalBellOutput` — 터미널 벨(BEL) 출력. 장치 없이 어디서나 동작.
//! - `RodioOutput` — 스피커 출력 (`rodio` feature)

use async_trait::async_trait;
use hubwatch_core::error::CoreError;
use hubwatch_core::ports::audio::{AudioOutput, AudioSource, PlaybackOptions};
use parking_lot::Mutex;
use std::io::Write;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// 인코딩 형식 추정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
    Flac,
}

/// 매직 바이트로 오디오 형식 추정
pub fn sniff_format(bytes: &[u8]) -> Option<AudioFormat> {
    if crate::tone::looks_like_wav(bytes) {
        return Some(AudioFormat::Wav);
    }
    if bytes.starts_with(b"OggS") {
        return Some(AudioFormat::Ogg);
    }
    if bytes.starts_with(b"fLaC") {
        return Some(AudioFormat::Flac);
    }
    if bytes.starts_with(b"ID3") || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0)
    {
        return Some(AudioFormat::Mp3);
    }
    None
}

/// 반복 재생 시 벨 간격
const BELL_REPEAT_INTERVAL: Duration = Duration::from_millis(1200);

/// 터미널 벨 출력
///
/// 데이터를 디코딩하지는 않지만 알려진 오디오 형식이 아니면 거부한다.
pub struct TerminalBellOutput {
    repeat_task: Mutex<Option<JoinHandle<()>>>,
}

impl TerminalBellOutput {
    pub fn new() -> Self {
        Self {
            repeat_task: Mutex::new(None),
        }
    }

    fn ring() {
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }
}

impl Default for TerminalBellOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioOutput for TerminalBellOutput {
    async fn play(&self, source: &AudioSource, options: &PlaybackOptions) -> Result<(), CoreError> {
        if let AudioSource::Encoded { label, bytes } = source {
            if sniff_format(bytes).is_none() {
                return Err(CoreError::Playback(format!(
                    "알 수 없는 오디오 형식: {label} ({} bytes)",
                    bytes.len()
                )));
            }
        }

        self.stop().await;
        if options.volume <= 0.0 {
            debug!("볼륨 0 — 벨 생략");
            return Ok(());
        }

        Self::ring();
        debug!(source = source.label(), looped = options.looped, "터미널 벨");

        if options.looped {
            let handle = tokio::spawn(async move {
                let mut interval = tokio::time::interval(BELL_REPEAT_INTERVAL);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    Self::ring();
                }
            });
            *self.repeat_task.lock() = Some(handle);
        }
        Ok(())
    }

    async fn stop(&self) {
        if let Some(handle) = self.repeat_task.lock().take() {
            handle.abort();
        }
    }

    fn name(&self) -> &str {
        "bell"
    }
}

#[cfg(feature = "rodio")]
pub use speaker::RodioOutput;

#[cfg(feature = "rodio")]
mod speaker {
    //! rodio 기반 스피커 출력.
    //!
    //! `OutputStream`은 `Send`가 아니므로 전용 스레드가 소유하고 명령 채널로 제어한다.

    use super::*;
    use rodio::source::{SineWave, Source};
    use rodio::{Decoder, OutputStream, Sink};
    use std::io::Cursor;
    use std::sync::mpsc;
    use tokio::sync::oneshot;
    use tracing::warn;

    enum Command {
        Play {
            source: AudioSource,
            options: PlaybackOptions,
            reply: oneshot::Sender<Result<(), CoreError>>,
        },
        Stop,
    }

    /// 스피커 출력
    pub struct RodioOutput {
        commands: mpsc::Sender<Command>,
    }

    impl RodioOutput {
        /// 출력 스레드 시작. 장치를 열 수 없으면 에러.
        pub fn new() -> Result<Self, CoreError> {
            let (tx, rx) = mpsc::channel();
            let (ready_tx, ready_rx) = mpsc::channel();

            std::thread::Builder::new()
                .name("hubwatch-audio".to_string())
                .spawn(move || run_device(rx, ready_tx))
                .map_err(|e| CoreError::Playback(format!("오디오 스레드 생성 실패: {e}")))?;

            ready_rx
                .recv()
                .map_err(|_| CoreError::Playback("오디오 스레드가 종료됨".to_string()))??;

            Ok(Self { commands: tx })
        }
    }

    fn run_device(rx: mpsc::Receiver<Command>, ready: mpsc::Sender<Result<(), CoreError>>) {
        let (_stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                let _ = ready.send(Err(CoreError::Playback(format!("오디오 장치 열기 실패: {e}"))));
                return;
            }
        };
        let _ = ready.send(Ok(()));

        let mut current: Option<Sink> = None;
        while let Ok(command) = rx.recv() {
            match command {
                Command::Stop => {
                    if let Some(sink) = current.take() {
                        sink.stop();
                    }
                }
                Command::Play {
                    source,
                    options,
                    reply,
                } => {
                    if let Some(sink) = current.take() {
                        sink.stop();
                    }
                    let result = Sink::try_new(&handle)
                        .map_err(|e| CoreError::Playback(format!("싱크 생성 실패: {e}")))
                        .and_then(|sink| {
                            sink.set_volume(options.volume);
                            append(&sink, source, options.looped)?;
                            Ok(sink)
                        });
                    match result {
                        Ok(sink) => {
                            current = Some(sink);
                            let _ = reply.send(Ok(()));
                        }
                        Err(e) => {
                            warn!("재생 실패: {e}");
                            let _ = reply.send(Err(e));
                        }
                    }
                }
            }
        }
        debug!("오디오 스레드 종료");
    }

    fn append(sink: &Sink, source: AudioSource, looped: bool) -> Result<(), CoreError> {
        match source {
            AudioSource::Encoded { label, bytes } => {
                let decoder = Decoder::new(Cursor::new(bytes))
                    .map_err(|e| CoreError::Playback(format!("{label} 디코딩 실패: {e}")))?;
                if looped {
                    sink.append(decoder.repeat_infinite());
                } else {
                    sink.append(decoder);
                }
            }
            AudioSource::Tone {
                frequency_hz,
                duration_ms,
            } => {
                let tone = SineWave::new(frequency_hz)
                    .take_duration(Duration::from_millis(duration_ms))
                    .amplify(0.5);
                if looped {
                    sink.append(tone.repeat_infinite());
                } else {
                    sink.append(tone);
                }
            }
        }
        Ok(())
    }

    #[async_trait]
    impl AudioOutput for RodioOutput {
        async fn play(
            &self,
            source: &AudioSource,
            options: &PlaybackOptions,
        ) -> Result<(), CoreError> {
            let (reply, rx) = oneshot::channel();
            self.commands
                .send(Command::Play {
                    source: source.clone(),
                    options: *options,
                    reply,
                })
                .map_err(|_| CoreError::Playback("오디오 스레드가 종료됨".to_string()))?;
            rx.await
                .map_err(|_| CoreError::Playback("오디오 스레드 응답 없음".to_string()))?
        }

        async fn stop(&self) {
            let _ = self.commands.send(Command::Stop);
        }

        fn name(&self) -> &str {
            "rodio"
        }
    }
}
