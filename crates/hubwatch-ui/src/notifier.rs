//! 데스크톱 알림 어댑터.
//!
//! `DesktopNotifier` 포트 구현. notify-rust 기반.
//! 데스크톱 OS에는 브라우저식 권한 창이 없으므로 요청 시 바로 허용으로 바뀐다.
//! 사용자가 알림을 끄면(`disabled`) 요청해도 거부 상태로 남는다.

use async_trait::async_trait;
use hubwatch_core::error::CoreError;
use hubwatch_core::ports::notifier::{DesktopNotifier, NotificationPermission};
use notify_rust::Notification;
use parking_lot::Mutex;
use tracing::debug;

const APP_NAME: &str = "hubwatch";

/// 본문 최대 글자 수
const MAX_BODY_CHARS: usize = 200;

/// 데스크톱 알림 어댑터 — `DesktopNotifier` 포트 구현
pub struct DesktopNotifierImpl {
    permission: Mutex<NotificationPermission>,
    allow_requests: bool,
}

impl DesktopNotifierImpl {
    /// 새 알림 어댑터 생성 (권한 미결정 상태)
    pub fn new() -> Self {
        Self {
            permission: Mutex::new(NotificationPermission::Default),
            allow_requests: true,
        }
    }

    /// 알림이 꺼진 어댑터 — 권한 요청이 항상 거부된다
    pub fn disabled() -> Self {
        Self {
            permission: Mutex::new(NotificationPermission::Denied),
            allow_requests: false,
        }
    }
}

impl Default for DesktopNotifierImpl {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() > MAX_BODY_CHARS {
        let head: String = body.chars().take(MAX_BODY_CHARS).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}

#[async_trait]
impl DesktopNotifier for DesktopNotifierImpl {
    async fn permission(&self) -> NotificationPermission {
        *self.permission.lock()
    }

    async fn request_permission(&self) -> NotificationPermission {
        let mut permission = self.permission.lock();
        if *permission == NotificationPermission::Default {
            *permission = if self.allow_requests {
                NotificationPermission::Granted
            } else {
                NotificationPermission::Denied
            };
            debug!(permission = ?*permission, "알림 권한 결정");
        }
        *permission
    }

    async fn show_notification(&self, title: &str, body: &str) -> Result<(), CoreError> {
        if *self.permission.lock() != NotificationPermission::Granted {
            return Err(CoreError::PermissionDenied("데스크톱 알림".to_string()));
        }
        debug!("알림: {title}");

        Notification::new()
            .summary(title)
            .body(&truncate_body(body))
            .appname(APP_NAME)
            .show()
            .map_err(|e| CoreError::Internal(format!("알림 표시 실패: {e}")))?;

        Ok(())
    }
}
