//! 시계 포트.

use chrono::{DateTime, Local};

/// 현재 시각 제공자 (디바운스, 시간대/요일 필터용)
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// 시스템 시계
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
