//! URL 알림음 다운로드.

use async_trait::async_trait;
use hubwatch_core::error::CoreError;
use hubwatch_core::ports::audio::SoundFetcher;
use std::time::Duration;
use tracing::debug;

/// 알림음 최대 크기 (바이트)
pub const MAX_SOUND_BYTES: usize = 10 * 1024 * 1024;

/// reqwest 기반 `SoundFetcher`
pub struct HttpSoundFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpSoundFetcher {
    pub fn new(timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;
        Ok(Self {
            client,
            max_bytes: MAX_SOUND_BYTES,
        })
    }

    /// 최대 크기 변경
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn too_large(&self, size: u64, url: &str) -> CoreError {
        CoreError::Playback(format!(
            "알림음이 너무 큼 ({size} bytes, 최대 {}): {url}",
            self.max_bytes
        ))
    }
}

#[async_trait]
impl SoundFetcher for HttpSoundFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError> {
        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("알림음 요청 실패: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Network(format!("알림음 다운로드 실패 ({status}): {url}")));
        }

        if let Some(len) = resp.content_length() {
            if len > self.max_bytes as u64 {
                return Err(self.too_large(len, url));
            }
        }

        // 길이 헤더가 없는 응답도 조각 단위로 한도 적용
        let mut bytes = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| CoreError::Network(format!("알림음 본문 읽기 실패: {e}")))?
        {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large((bytes.len() + chunk.len()) as u64, url));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err(CoreError::Playback(format!("빈 알림음: {url}")));
        }

        debug!(url, size = bytes.len(), "알림음 다운로드 완료");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpSoundFetcher {
        HttpSoundFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn downloads_sound_bytes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/alert.wav")
            .with_status(200)
            .with_header("content-type", "audio/wav")
            .with_body(b"RIFF\0\0\0\0WAVE".as_slice())
            .create_async()
            .await;

        let bytes = fetcher()
            .fetch(&format!("{}/alert.wav", server.url()))
            .await
            .unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_is_network_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.wav")
            .with_status(404)
            .create_async()
            .await;

        let result = fetcher()
            .fetch(&format!("{}/missing.wav", server.url()))
            .await;
        assert!(matches!(result, Err(CoreError::Network(_))));
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/empty.wav")
            .with_status(200)
            .create_async()
            .await;

        let result = fetcher().fetch(&format!("{}/empty.wav", server.url())).await;
        assert!(matches!(result, Err(CoreError::Playback(_))));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/big.wav")
            .with_status(200)
            .with_body(vec![0u8; 64])
            .create_async()
            .await;

        let result = fetcher()
            .with_max_bytes(16)
            .fetch(&format!("{}/big.wav", server.url()))
            .await;
        assert!(matches!(result, Err(CoreError::Playback(ref m)) if m.contains("너무 큼")));
    }

    #[tokio::test]
    async fn body_at_limit_is_accepted() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/exact.wav")
            .with_status(200)
            .with_body(vec![1u8; 16])
            .create_async()
            .await;

        let bytes = fetcher()
            .with_max_bytes(16)
            .fetch(&format!("{}/exact.wav", server.url()))
            .await
            .unwrap();
        assert_eq!(bytes.len(), 16);
    }
}
