//! 변경 알림 전파.
//!
//! 설정/테마/모니터 상태 변경을 모든 화면과 사이트 탭에 알린다.
//! 전달은 최선 노력 — 수신자 0명, 전송 실패 모두 로그만 남기고 무시한다.

use hubwatch_core::config::AppConfig;
use hubwatch_core::models::event::BroadcastEvent;
use hubwatch_core::models::monitor::MonitorState;
use hubwatch_core::ports::messaging::MessageChannel;
use std::sync::Arc;
use tracing::debug;

/// 한 번의 전파 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// 도달한 화면 수
    pub surfaces: usize,
    /// 도달한 탭 수
    pub tabs: usize,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.surfaces + self.tabs
    }
}

/// 변경 알림 전파기
pub struct NotificationDispatcher {
    channel: Arc<dyn MessageChannel>,
    tab_pattern: String,
}

impl NotificationDispatcher {
    pub fn new(channel: Arc<dyn MessageChannel>, tab_pattern: impl Into<String>) -> Self {
        Self {
            channel,
            tab_pattern: tab_pattern.into(),
        }
    }

    /// 모든 화면 + 패턴에 맞는 탭으로 전파
    pub async fn broadcast(&self, event: &BroadcastEvent) -> DispatchReport {
        let surfaces = match self.channel.send_to_surfaces(event).await {
            Ok(n) => n,
            Err(e) => {
                debug!(kind = event.kind(), "화면 전파 실패 (무시): {e}");
                0
            }
        };
        let tabs = match self.channel.send_to_tabs(&self.tab_pattern, event).await {
            Ok(n) => n,
            Err(e) => {
                debug!(kind = event.kind(), "탭 전파 실패 (무시): {e}");
                0
            }
        };

        let report = DispatchReport { surfaces, tabs };
        if report.total() == 0 {
            debug!(kind = event.kind(), "전파 대상 없음");
        } else {
            debug!(kind = event.kind(), surfaces, tabs, "변경 알림 전파");
        }
        report
    }

    pub async fn settings_changed(&self, config: &AppConfig) -> DispatchReport {
        self.broadcast(&BroadcastEvent::SettingsChanged(Box::new(config.clone())))
            .await
    }

    pub async fn monitor_state_changed(&self, state: MonitorState) -> DispatchReport {
        self.broadcast(&BroadcastEvent::MonitorStateChanged(state))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::LocalBus;
    use async_trait::async_trait;
    use hubwatch_core::config::Theme;
    use hubwatch_core::error::CoreError;

    struct BrokenChannel;

    #[async_trait]
    impl MessageChannel for BrokenChannel {
        async fn send_to_surfaces(&self, _event: &BroadcastEvent) -> Result<usize, CoreError> {
            Err(CoreError::Internal("끊김".to_string()))
        }

        async fn send_to_tabs(
            &self,
            _pattern: &str,
            _event: &BroadcastEvent,
        ) -> Result<usize, CoreError> {
            Err(CoreError::Internal("끊김".to_string()))
        }
    }

    #[tokio::test]
    async fn zero_recipients_is_not_an_error() {
        let dispatcher = NotificationDispatcher::new(Arc::new(LocalBus::new(4)), "https://x/*");
        let report = dispatcher.monitor_state_changed(MonitorState::Stopped).await;
        assert_eq!(report, DispatchReport::default());
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let dispatcher = NotificationDispatcher::new(Arc::new(BrokenChannel), "https://x/*");
        let report = dispatcher
            .broadcast(&BroadcastEvent::ThemeChanged(Theme::Dark))
            .await;
        assert_eq!(report.total(), 0);
    }

    #[tokio::test]
    async fn reaches_surfaces_and_tabs() {
        let bus = Arc::new(LocalBus::new(4));
        let mut surface = bus.subscribe_surface();
        let mut tab = bus.register_tab("https://www.raterhub.com/evaluation/rater");
        let dispatcher = NotificationDispatcher::new(bus.clone(), "https://www.raterhub.com/*");

        let config = AppConfig::default_config();
        let report = dispatcher.settings_changed(&config).await;
        assert_eq!(report, DispatchReport { surfaces: 1, tabs: 1 });

        let expected = BroadcastEvent::SettingsChanged(Box::new(config));
        assert_eq!(surface.recv().await.unwrap(), expected);
        assert_eq!(tab.recv().await, Some(expected));
    }
}
