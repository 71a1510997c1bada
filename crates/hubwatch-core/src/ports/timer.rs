//! 폴링 타이머 포트.
//!
//! 구현: `hubwatch-app` crate (`tokio::time::interval` 태스크)

use std::time::Duration;

/// 타이머 식별자
///
/// 틱은 자신을 만든 타이머의 핸들을 싣고 도착하므로, 취소된 타이머의 늦은 틱을 구별할 수 있다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// 반복 타이머 인터페이스
pub trait PollTimer: Send + Sync {
    /// 주기 타이머 시작. 첫 틱은 한 주기 뒤에 도착한다.
    fn start(&self, interval: Duration) -> TimerHandle;

    /// 타이머 취소 (즉시, 결정적으로). 이미 취소된 핸들은 무시한다.
    fn cancel(&self, handle: TimerHandle);
}
