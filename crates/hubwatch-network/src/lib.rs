//! # hubwatch-network
//!
//! 네트워크 어댑터.
//!
//! - [`http_page::HttpPage`] — HTTP로 페이지를 읽어 스냅샷을 만드는 `PageInspector`
//! - [`sound_fetch::HttpSoundFetcher`] — URL 알림음 다운로드

pub mod http_page;
pub mod snapshot;
pub mod sound_fetch;
