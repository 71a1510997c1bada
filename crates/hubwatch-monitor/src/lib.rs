//! # hubwatch-monitor
//!
//! 작업 대기열 페이지 모니터링.
//! 페이지 상태 분류, 작업 정보 추출, 필터 평가, 폴링 상태 머신을 제공한다.

pub mod classifier;
pub mod controller;
pub mod extractor;
pub mod filter;
pub mod session;
pub mod stats;
