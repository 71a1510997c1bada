//! 모니터링 통계 (가벼운 사용 분석).

use serde::Serialize;

/// 실행 중 누적되는 카운터
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    /// 처리한 틱 수
    pub ticks: u64,
    /// 자동 새로고침 수
    pub refreshes: u64,
    /// 기준 페이지로 되돌린 수
    pub redirects: u64,
    /// 발견한 작업 수
    pub tasks_seen: u64,
    /// 필터를 통과한 작업 수
    pub tasks_accepted: u64,
    /// 필터에 걸린 작업 수
    pub tasks_rejected: u64,
    /// 획득 컨트롤 활성화 시도 수
    pub activations: u64,
    /// 울린 알람 수
    pub alarms: u64,
}
