//! 컨텍스트 간 메시징 포트.
//!
//! 구현: `hubwatch-app` crate (`LocalBus`, tokio broadcast)
//! 수신자가 0명일 수 있으며 전달/순서는 보장하지 않는다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::event::BroadcastEvent;

/// 단방향(fire-and-forget) 메시지 채널
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// 모든 화면(설정/팝업 등)으로 전송. 도달한 수신자 수 반환.
    async fn send_to_surfaces(&self, event: &BroadcastEvent) -> Result<usize, CoreError>;

    /// URL 패턴에 맞는 모든 탭으로 전송. 도달한 탭 수 반환.
    async fn send_to_tabs(&self, pattern: &str, event: &BroadcastEvent) -> Result<usize, CoreError>;
}
