//! 데스크톱 알림 포트.
//!
//! 구현: `hubwatch-ui` crate (notify-rust)

use async_trait::async_trait;

use crate::error::CoreError;

/// 알림 권한 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// 아직 결정되지 않음 (요청 필요)
    Default,
}

/// 데스크톱 알림 인터페이스
#[async_trait]
pub trait DesktopNotifier: Send + Sync {
    /// 현재 권한 조회
    async fn permission(&self) -> NotificationPermission;

    /// 권한 요청
    async fn request_permission(&self) -> NotificationPermission;

    /// 알림 표시 (제목 + 본문)
    async fn show_notification(&self, title: &str, body: &str) -> Result<(), CoreError>;
}
