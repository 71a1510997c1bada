//! 모니터링 세션.
//!
//! `start` ~ `stop` 한 번의 실행 동안 유지되는 상태.
//! 설정 변경이나 페이지 이동마다 폐기 후 다시 만들어진다.

use chrono::{DateTime, Local};
use hubwatch_core::ports::timer::TimerHandle;
use std::time::Duration;

/// 모니터링 세션
#[derive(Debug, Clone)]
pub struct MonitorSession {
    /// 이 세션이 소유한 폴링 타이머
    pub timer: TimerHandle,
    /// 세션 시작 시각
    pub started_at: DateTime<Local>,
    /// 마지막 자동 새로고침 시각 (이전 세션에서 이어받음)
    pub last_action_at: Option<DateTime<Local>>,
    /// 미완료 작업 안내를 이미 사용자에게 확인받았는지
    pub incomplete_tasks_acknowledged: bool,
}

impl MonitorSession {
    pub fn new(
        timer: TimerHandle,
        started_at: DateTime<Local>,
        last_action_at: Option<DateTime<Local>>,
    ) -> Self {
        Self {
            timer,
            started_at,
            last_action_at,
            incomplete_tasks_acknowledged: false,
        }
    }

    /// 디바운스 창이 지났는지 (기록이 없으면 true)
    pub fn debounce_elapsed(&self, now: DateTime<Local>, window: Duration) -> bool {
        match self.last_action_at {
            None => true,
            Some(last) => match (now - last).to_std() {
                Ok(elapsed) => elapsed >= window,
                // 시계가 뒤로 간 경우: 기록 시점 이전이므로 아직 창 안
                Err(_) => false,
            },
        }
    }

    /// 자동 새로고침 기록
    pub fn record_action(&mut self, now: DateTime<Local>) {
        self.last_action_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 14, 12, 0, secs).unwrap()
    }

    #[test]
    fn debounce_window() {
        let mut session = MonitorSession::new(TimerHandle(1), at(0), None);
        let window = Duration::from_secs(2);
        assert!(session.debounce_elapsed(at(0), window));

        session.record_action(at(0));
        assert!(!session.debounce_elapsed(at(1), window));
        assert!(session.debounce_elapsed(at(2), window));
    }

    #[test]
    fn clock_going_backwards_stays_debounced() {
        let mut session = MonitorSession::new(TimerHandle(1), at(10), None);
        session.record_action(at(10));
        assert!(!session.debounce_elapsed(at(5), Duration::from_secs(2)));
    }
}
