//! # hubwatch-alarm
//!
//! 작업 발견 시 울리는 알람.
//! 사용자 지정 음원 → 내장 기본음 → 합성 비프음 → 무음 순으로 폴백하고,
//! 허용된 경우 데스크톱 알림을 함께 표시한다.

pub mod output;
pub mod player;
pub mod tone;
