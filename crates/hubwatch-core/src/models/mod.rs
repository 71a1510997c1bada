//! 도메인 모델.
//!
//! 페이지 스냅샷/상태, 작업 정보, 모니터 상태, 컨텍스트 간 이벤트.

pub mod event;
pub mod monitor;
pub mod page;
pub mod task;
