//! 비프음 합성.
//!
//! 16-bit PCM 모노 WAV를 메모리에서 만든다. 내장 기본음(차임)도 여기서 합성하므로
//! 별도 음원 파일을 배포하지 않는다.

use std::f32::consts::TAU;

/// 합성 샘플레이트
pub const SAMPLE_RATE: u32 = 22_050;

/// 음 앞뒤 페이드 길이 — 클릭 잡음 방지
const FADE_MS: u32 = 8;

/// 내장 기본음 구성 (주파수 Hz, 길이 ms)
const CHIME_NOTES: &[(f32, u32)] = &[(987.77, 160), (1318.51, 360)];

/// 음 사이 무음 길이
const CHIME_GAP_MS: u32 = 30;

/// 단일 사인파 WAV 생성
pub fn sine_wav(frequency_hz: f32, duration_ms: u64) -> Vec<u8> {
    let samples = sine_samples(frequency_hz, duration_ms.min(u32::MAX as u64) as u32);
    encode_wav(&samples, SAMPLE_RATE)
}

/// 내장 기본음 WAV 생성 (상승 2음 차임)
pub fn bundled_chime() -> Vec<u8> {
    let gap = vec![0i16; ms_to_samples(CHIME_GAP_MS)];
    let mut samples = Vec::new();
    for (i, (freq, ms)) in CHIME_NOTES.iter().enumerate() {
        if i > 0 {
            samples.extend_from_slice(&gap);
        }
        samples.extend(sine_samples(*freq, *ms));
    }
    encode_wav(&samples, SAMPLE_RATE)
}

fn ms_to_samples(ms: u32) -> usize {
    (SAMPLE_RATE as u64 * ms as u64 / 1000) as usize
}

fn sine_samples(frequency_hz: f32, duration_ms: u32) -> Vec<i16> {
    let total = ms_to_samples(duration_ms);
    let fade = ms_to_samples(FADE_MS).min(total / 2).max(1);
    let amplitude = i16::MAX as f32 * 0.6;

    (0..total)
        .map(|n| {
            let t = n as f32 / SAMPLE_RATE as f32;
            let envelope = if n < fade {
                n as f32 / fade as f32
            } else if n >= total - fade {
                (total - n) as f32 / fade as f32
            } else {
                1.0
            };
            ((TAU * frequency_hz * t).sin() * amplitude * envelope) as i16
        })
        .collect()
}

/// RIFF/WAVE 컨테이너로 감싸기
fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    const CHANNELS: u16 = 1;
    const BITS: u16 = 16;
    let block_align = CHANNELS * BITS / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = (samples.len() * 2) as u32;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

/// WAV 헤더처럼 보이는지 (디코딩 전 빠른 확인)
pub fn looks_like_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_wav_has_valid_header_and_length() {
        let wav = sine_wav(880.0, 100);
        assert!(looks_like_wav(&wav));
        let data_len = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]) as usize;
        assert_eq!(data_len, ms_to_samples(100) * 2);
        assert_eq!(wav.len(), 44 + data_len);
    }

    #[test]
    fn chime_is_longer_than_single_note() {
        let chime = bundled_chime();
        assert!(looks_like_wav(&chime));
        assert!(chime.len() > sine_wav(987.77, 160).len() * 2);
    }

    #[test]
    fn envelope_starts_and_ends_silent() {
        let samples = sine_samples(440.0, 50);
        assert_eq!(samples[0], 0);
        assert!(samples.last().copied().unwrap_or(0).abs() < 200);
    }

    #[test]
    fn zero_duration_is_header_only() {
        let wav = sine_wav(440.0, 0);
        assert_eq!(wav.len(), 44);
    }

    #[test]
    fn garbage_is_not_wav() {
        assert!(!looks_like_wav(b"not audio at all"));
        assert!(!looks_like_wav(b""));
    }
}
