//! 로컬 메시지 버스.
//!
//! `MessageChannel` 포트 구현. 프로세스 안의 화면(surface) 구독자는 `tokio::broadcast`로,
//! 탭 구독자는 URL과 함께 등록된 개별 채널로 받는다. 수신자가 없어도 에러가 아니다.

use async_trait::async_trait;
use hubwatch_core::error::CoreError;
use hubwatch_core::models::event::BroadcastEvent;
use hubwatch_core::ports::messaging::MessageChannel;
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

struct TabEntry {
    url: String,
    tx: mpsc::UnboundedSender<BroadcastEvent>,
}

/// 프로세스 내 메시지 버스
pub struct LocalBus {
    surfaces: broadcast::Sender<BroadcastEvent>,
    tabs: RwLock<Vec<TabEntry>>,
}

impl LocalBus {
    pub fn new(capacity: usize) -> Self {
        let (surfaces, _) = broadcast::channel(capacity);
        Self {
            surfaces,
            tabs: RwLock::new(Vec::new()),
        }
    }

    /// 화면 구독자 생성
    pub fn subscribe_surface(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.surfaces.subscribe()
    }

    /// 탭 등록. 수신기를 버리면 다음 전송 때 등록이 정리된다.
    pub fn register_tab(&self, url: &str) -> mpsc::UnboundedReceiver<BroadcastEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.tabs.write().push(TabEntry {
            url: url.to_string(),
            tx,
        });
        rx
    }

    /// 등록된 탭 수
    pub fn tab_count(&self) -> usize {
        self.tabs.read().len()
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl MessageChannel for LocalBus {
    async fn send_to_surfaces(&self, event: &BroadcastEvent) -> Result<usize, CoreError> {
        // 구독자 0명이면 send가 Err — 정상 상황
        Ok(self.surfaces.send(event.clone()).unwrap_or(0))
    }

    async fn send_to_tabs(&self, pattern: &str, event: &BroadcastEvent) -> Result<usize, CoreError> {
        let mut tabs = self.tabs.write();
        let mut delivered = 0;
        tabs.retain(|tab| {
            if !url_matches(pattern, &tab.url) {
                return !tab.tx.is_closed();
            }
            match tab.tx.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    debug!(url = %tab.url, "닫힌 탭 등록 해제");
                    false
                }
            }
        });
        Ok(delivered)
    }
}

/// `*` 와일드카드 URL 패턴 매칭 (예: `https://www.raterhub.com/*`)
pub fn url_matches(pattern: &str, url: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return false;
    };
    let Some(mut rest) = url.strip_prefix(first) else {
        return false;
    };

    let remaining: Vec<&str> = parts.collect();
    let Some((last, middle)) = remaining.split_last() else {
        // 와일드카드 없음 — 완전 일치
        return rest.is_empty();
    };

    for piece in middle {
        match rest.find(piece) {
            Some(idx) => rest = &rest[idx + piece.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubwatch_core::models::monitor::MonitorState;

    fn event() -> BroadcastEvent {
        BroadcastEvent::MonitorStateChanged(MonitorState::Polling)
    }

    #[tokio::test]
    async fn surfaces_without_subscribers_is_zero() {
        let bus = LocalBus::new(8);
        assert_eq!(bus.send_to_surfaces(&event()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn surfaces_reach_every_subscriber() {
        let bus = LocalBus::new(8);
        let mut rx1 = bus.subscribe_surface();
        let mut rx2 = bus.subscribe_surface();

        assert_eq!(bus.send_to_surfaces(&event()).await.unwrap(), 2);
        assert_eq!(rx1.recv().await.unwrap(), event());
        assert_eq!(rx2.recv().await.unwrap(), event());
    }

    #[tokio::test]
    async fn tabs_filtered_by_pattern() {
        let bus = LocalBus::new(8);
        let mut hub = bus.register_tab("https://www.raterhub.com/evaluation/rater");
        let mut other = bus.register_tab("https://example.com/");

        let n = bus
            .send_to_tabs("https://www.raterhub.com/*", &event())
            .await
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(hub.recv().await, Some(event()));
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_tabs_are_pruned() {
        let bus = LocalBus::new(8);
        let rx = bus.register_tab("https://www.raterhub.com/a");
        drop(rx);
        assert_eq!(bus.tab_count(), 1);

        let n = bus
            .send_to_tabs("https://www.raterhub.com/*", &event())
            .await
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(bus.tab_count(), 0);
    }

    #[test]
    fn wildcard_matching() {
        assert!(url_matches("https://www.raterhub.com/*", "https://www.raterhub.com/"));
        assert!(url_matches(
            "https://www.raterhub.com/*",
            "https://www.raterhub.com/evaluation/rater?x=1"
        ));
        assert!(url_matches("https://*.raterhub.com/*", "https://www.raterhub.com/a"));
        assert!(!url_matches("https://www.raterhub.com/*", "http://www.raterhub.com/"));
        assert!(url_matches("https://a.com/x", "https://a.com/x"));
        assert!(!url_matches("https://a.com/x", "https://a.com/xy"));
    }
}
