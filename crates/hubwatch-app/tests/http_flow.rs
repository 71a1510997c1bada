//! HTTP 페이지 어댑터 + 분류기 + 제어기 통합 테스트 (mockito 서버).
//!
//! 타이머는 수동으로 틱을 넣는 가짜를 사용한다.

use async_trait::async_trait;
use hubwatch_core::config::{AppConfig, MonitorMode};
use hubwatch_core::config_manager::SettingsStore;
use hubwatch_core::error::CoreError;
use hubwatch_core::models::monitor::MonitorState;
use hubwatch_core::ports::alarm::{Alarm, AlarmOutcome, AlarmRequest};
use hubwatch_core::ports::clock::SystemClock;
use hubwatch_core::ports::prompt::{DecisionNotice, DecisionPrompt};
use hubwatch_core::ports::timer::{PollTimer, TimerHandle};
use hubwatch_monitor::classifier::RuleClassifier;
use hubwatch_monitor::controller::{ActivationPath, MonitorController, MonitorPorts, TickOutcome};
use hubwatch_network::http_page::HttpPage;
use mockito::Matcher;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
struct ManualTimer {
    next: AtomicU64,
    cancelled: Mutex<Vec<TimerHandle>>,
}

impl PollTimer for ManualTimer {
    fn start(&self, _interval: Duration) -> TimerHandle {
        TimerHandle(self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.cancelled.lock().push(handle);
    }
}

#[derive(Default)]
struct CountingAlarm {
    raised: Mutex<Vec<AlarmRequest>>,
}

#[async_trait]
impl Alarm for CountingAlarm {
    async fn raise(&self, request: &AlarmRequest) -> AlarmOutcome {
        self.raised.lock().push(request.clone());
        AlarmOutcome::Default
    }

    async fn silence(&self) {}

    fn is_active(&self) -> bool {
        false
    }
}

struct NoPrompt;

#[async_trait]
impl DecisionPrompt for NoPrompt {
    async fn present(&self, _notice: &DecisionNotice) -> Result<(), CoreError> {
        Ok(())
    }
}

struct Fixture {
    controller: MonitorController,
    alarm: Arc<CountingAlarm>,
    page: Arc<HttpPage>,
    _dir: TempDir,
}

fn fixture(server_url: &str, start_path: &str, configure: impl FnOnce(&mut AppConfig)) -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = SettingsStore::with_path(dir.path().join("config.json")).unwrap();
    let config = store
        .update_with(|c| {
            c.monitor.enabled = true;
            c.monitor.acquire_alarm_delay_ms = 0;
            c.site.main_url = format!("{server_url}/evaluation/rater");
            c.site.task_index_url = format!("{server_url}/evaluation/rater/task/index");
            c.site.request_timeout_ms = 5_000;
            configure(c);
        })
        .unwrap();

    let page = Arc::new(HttpPage::new(&config.site, &format!("{server_url}{start_path}")).unwrap());
    let alarm = Arc::new(CountingAlarm::default());
    let ports = MonitorPorts {
        page: page.clone(),
        timer: Arc::new(ManualTimer::default()),
        alarm: alarm.clone(),
        prompt: Arc::new(NoPrompt),
        clock: Arc::new(SystemClock),
    };
    let controller = MonitorController::new(
        ports,
        Box::new(RuleClassifier::new(config.site.clone())),
        store,
    );

    Fixture {
        controller,
        alarm,
        page,
        _dir: dir,
    }
}

const AVAILABLE_HTML: &str = r#"<html><body>
<h2>Search evaluation</h2>
<p>Estimated time: 3 minutes. Pay: $0.04</p>
<a href="/evaluation/rater/task/new?acquireToken=abc">Acquire if available</a>
</body></html>"#;

#[tokio::test]
async fn forbidden_start_page_redirects_then_acquires() {
    let mut server = mockito::Server::new_async().await;
    let forbidden = server
        .mock("GET", "/evaluation/rater/task/show")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("<p>Forbidden</p>")
        .expect(1)
        .create_async()
        .await;
    let main = server
        .mock("GET", "/evaluation/rater")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(AVAILABLE_HTML)
        .expect(1)
        .create_async()
        .await;
    let acquire = server
        .mock("GET", "/evaluation/rater/task/new")
        .match_query(Matcher::UrlEncoded("acquireToken".into(), "abc".into()))
        .with_status(200)
        .with_body("<p>Task acquired</p>")
        .expect(1)
        .create_async()
        .await;

    let mut fx = fixture(&server.url(), "/evaluation/rater/task/show?taskIds=7", |c| {
        c.monitor.mode = MonitorMode::AlarmAndClick;
    });

    assert_eq!(fx.controller.start().await, MonitorState::Polling);
    forbidden.assert_async().await;
    main.assert_async().await;
    assert_eq!(fx.controller.stats().redirects, 1);

    let handle = fx.controller.active_timer().unwrap();
    let outcome = fx.controller.on_tick(handle).await;
    match outcome {
        TickOutcome::TaskAccepted {
            task,
            activation,
            alarm,
        } => {
            assert_eq!(task.duration_minutes, 3.0);
            assert!((task.reward_dollars - 0.04).abs() < 1e-9);
            assert_eq!(activation, Some(ActivationPath::Invoked));
            assert_eq!(alarm, AlarmOutcome::Default);
        }
        other => panic!("작업 수락 기대, 실제: {other:?}"),
    }

    acquire.assert_async().await;
    assert_eq!(fx.controller.state(), MonitorState::Stopped);
    assert_eq!(fx.alarm.raised.lock().len(), 1);
    assert!(fx
        .page
        .current_url()
        .unwrap()
        .contains("/evaluation/rater/task/new"));
}

#[tokio::test]
async fn alarm_only_mode_never_requests_acquire_url() {
    let mut server = mockito::Server::new_async().await;
    let _main = server
        .mock("GET", "/evaluation/rater")
        .with_status(200)
        .with_body(AVAILABLE_HTML)
        .create_async()
        .await;
    let acquire = server
        .mock("GET", "/evaluation/rater/task/new")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut fx = fixture(&server.url(), "/evaluation/rater", |_| {});
    assert_eq!(fx.controller.start().await, MonitorState::Polling);

    let handle = fx.controller.active_timer().unwrap();
    let outcome = fx.controller.on_tick(handle).await;
    assert!(matches!(
        outcome,
        TickOutcome::TaskAccepted {
            activation: None,
            ..
        }
    ));
    acquire.assert_async().await;
    assert_eq!(fx.alarm.raised.lock().len(), 1);
}

#[tokio::test]
async fn idle_main_page_is_refreshed_over_http() {
    let mut server = mockito::Server::new_async().await;
    let main = server
        .mock("GET", "/evaluation/rater")
        .with_status(200)
        .with_body("<p>No tasks are currently available.</p>")
        .expect(2)
        .create_async()
        .await;

    let mut fx = fixture(&server.url(), "/evaluation/rater", |_| {});
    assert_eq!(fx.controller.start().await, MonitorState::Polling);

    let handle = fx.controller.active_timer().unwrap();
    assert_eq!(fx.controller.on_tick(handle).await, TickOutcome::Refreshed);
    // 디바운스 창(2초) 안의 두 번째 틱은 요청하지 않음
    assert_eq!(fx.controller.on_tick(handle).await, TickOutcome::Debounced);

    main.assert_async().await;
    assert_eq!(fx.controller.state(), MonitorState::Polling);
    assert!(fx.alarm.raised.lock().is_empty());
}

#[tokio::test]
async fn unreachable_server_keeps_polling() {
    let dir = TempDir::new().unwrap();
    let store = SettingsStore::with_path(dir.path().join("config.json")).unwrap();
    let config = store
        .update_with(|c| {
            c.monitor.enabled = true;
            c.site.main_url = "http://127.0.0.1:9/evaluation/rater".to_string();
            c.site.request_timeout_ms = 500;
        })
        .unwrap();
    let page = Arc::new(HttpPage::new(&config.site, &config.site.main_url).unwrap());
    let ports = MonitorPorts {
        page,
        timer: Arc::new(ManualTimer::default()),
        alarm: Arc::new(CountingAlarm::default()),
        prompt: Arc::new(NoPrompt),
        clock: Arc::new(SystemClock),
    };
    let mut controller =
        MonitorController::new(ports, Box::new(RuleClassifier::new(config.site)), store);

    // 조회 실패는 폴링으로 재시도
    assert_eq!(controller.start().await, MonitorState::Polling);
    let handle = controller.active_timer().unwrap();
    assert_eq!(controller.on_tick(handle).await, TickOutcome::SnapshotFailed);
    assert_eq!(controller.state(), MonitorState::Polling);
}
