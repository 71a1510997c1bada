//! 모니터링 제어기.
//!
//! 폴링 타이머를 소유하고, 틱마다 페이지를 분류해 새로고침/리다이렉트/
//! 작업 획득/알람을 수행하는 상태 머신.
//!
//! 상태: `Stopped` → `Polling` ↔ `AwaitingUserDecision`
//!
//! 제어기는 하나의 러너 태스크가 독점 소유하며 `&mut self`로만 변경된다.
//! 타이머는 항상 최대 하나만 살아 있다 (`start` 시 기존 타이머를 먼저 해제).

use chrono::{DateTime, Local};
use hubwatch_core::config::{AppConfig, MonitorMode};
use hubwatch_core::config_manager::SettingsStore;
use hubwatch_core::models::monitor::MonitorState;
use hubwatch_core::models::page::{ControlKind, PageControl, PageSnapshot, PageState};
use hubwatch_core::models::task::TaskInfo;
use hubwatch_core::ports::alarm::{Alarm, AlarmNotice, AlarmOutcome, AlarmRequest, ToneSpec};
use hubwatch_core::ports::audio::PlaybackOptions;
use hubwatch_core::ports::clock::Clock;
use hubwatch_core::ports::page::PageInspector;
use hubwatch_core::ports::prompt::{DecisionNotice, DecisionPrompt};
use hubwatch_core::ports::timer::{PollTimer, TimerHandle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::classifier::PageClassifier;
use crate::extractor::extract_task_info;
use crate::filter;
use crate::session::MonitorSession;
use crate::stats::MonitorStats;

/// 획득 컨트롤 활성화 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPath {
    /// 컨트롤 직접 호출
    Invoked,
    /// 합성 클릭 이벤트
    SyntheticClick,
    /// 링크 대상으로 직접 이동
    Navigated,
    /// 모든 경로 실패
    Failed,
}

/// 틱 처리 결과
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// 현재 세션의 틱이 아님 (취소된 타이머 등)
    Ignored,
    /// 스냅샷 실패 — 다음 틱에서 재시도
    SnapshotFailed,
    /// 기준 페이지지만 인식 불가 — 다음 틱 대기
    Waiting,
    /// 작업 없음 → 기준 페이지 새로고침
    Refreshed,
    /// 작업 없음, 디바운스 창 안이라 생략
    Debounced,
    /// 제출 완료/작업 목록 페이지 → 기준 페이지로 이동 후 정지
    Redirected,
    /// 사용자가 작업 중 → 정지
    TaskActive,
    /// 다른 페이지로 이동함 → 정지
    NavigatedAway,
    /// 미완료 작업 안내 → 사용자 응답 대기
    AwaitingDecision,
    /// 필터에 걸린 작업 — 폴링 유지
    TaskRejected(TaskInfo),
    /// 작업 수락 → 정지 + (활성화) + 알람
    TaskAccepted {
        task: TaskInfo,
        activation: Option<ActivationPath>,
        alarm: AlarmOutcome,
    },
}

/// 제어기가 사용하는 포트 묶음
#[derive(Clone)]
pub struct MonitorPorts {
    pub page: Arc<dyn PageInspector>,
    pub timer: Arc<dyn PollTimer>,
    pub alarm: Arc<dyn Alarm>,
    pub prompt: Arc<dyn DecisionPrompt>,
    pub clock: Arc<dyn Clock>,
}

/// 모니터링 상태 머신
pub struct MonitorController {
    ports: MonitorPorts,
    classifier: Box<dyn PageClassifier>,
    store: SettingsStore,
    config: AppConfig,
    state: MonitorState,
    session: Option<MonitorSession>,
    /// 세션 사이에 이어지는 마지막 자동 새로고침 시각
    carried_last_action: Option<DateTime<Local>>,
    stats: MonitorStats,
}

impl MonitorController {
    /// 새 제어기 생성 (정지 상태). 설정은 저장소의 현재 값으로 시작한다.
    pub fn new(
        ports: MonitorPorts,
        classifier: Box<dyn PageClassifier>,
        store: SettingsStore,
    ) -> Self {
        let config = store.get();
        Self {
            ports,
            classifier,
            store,
            config,
            state: MonitorState::Stopped,
            session: None,
            carried_last_action: None,
            stats: MonitorStats::default(),
        }
    }

    /// 현재 상태
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// 현재 세션의 타이머 핸들
    pub fn active_timer(&self) -> Option<TimerHandle> {
        self.session.as_ref().map(|s| s.timer)
    }

    /// 누적 통계
    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// 제어기가 보고 있는 설정
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 모니터링 시작
    ///
    /// 기존 세션은 먼저 완전히 해제된다. 비활성 설정이면 아무 동작 없이 정지 상태로 남는다.
    /// 제출 완료/작업 목록 페이지면 기준 페이지로 한 번 이동한 뒤 다시 분류한다.
    pub async fn start(&mut self) -> MonitorState {
        self.teardown();
        self.state = MonitorState::Stopped;

        if !self.config.monitor.enabled {
            debug!("모니터링 비활성 — 시작 생략");
            return self.state;
        }

        let mut redirected = false;
        loop {
            let snapshot = match self.ports.page.snapshot().await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("시작 시 페이지 조회 실패, 폴링으로 재시도: {e}");
                    self.begin_session(false);
                    return self.state;
                }
            };

            let page_state = self.classifier.classify(&snapshot);
            debug!(?page_state, url = %snapshot.url, "시작 시 페이지 분류");

            match page_state {
                PageState::MainPageIdle | PageState::MainPageTaskAvailable => {
                    self.begin_session(false);
                }
                PageState::TaskShowForbidden | PageState::TaskIndex if !redirected => {
                    self.redirect_to_main().await;
                    redirected = true;
                    continue;
                }
                PageState::IncompleteTasksPending => {
                    self.enter_awaiting_decision().await;
                }
                other => {
                    info!(page_state = ?other, "모니터링 대상 페이지 아님 — 정지 유지");
                }
            }
            return self.state;
        }
    }

    /// 모니터링 정지 (타이머 즉시 해제)
    pub fn stop(&mut self, reason: &str) {
        self.teardown();
        if self.state != MonitorState::Stopped {
            info!(reason, "모니터링 정지");
        }
        self.state = MonitorState::Stopped;
    }

    /// 타이머 틱 처리
    pub async fn on_tick(&mut self, handle: TimerHandle) -> TickOutcome {
        let owns_tick = self.state == MonitorState::Polling
            && self.session.as_ref().is_some_and(|s| s.timer == handle);
        if !owns_tick {
            debug!(?handle, "현재 세션이 아닌 타이머 틱 무시");
            return TickOutcome::Ignored;
        }
        if !self.config.monitor.enabled {
            self.stop("설정 비활성");
            return TickOutcome::Ignored;
        }

        self.stats.ticks += 1;

        let snapshot = match self.ports.page.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("페이지 조회 실패, 다음 틱에서 재시도: {e}");
                return TickOutcome::SnapshotFailed;
            }
        };

        let page_state = self.classifier.classify(&snapshot);
        debug!(?page_state, url = %snapshot.url, "페이지 분류");

        match page_state {
            PageState::TaskShowForbidden | PageState::TaskIndex => {
                self.redirect_to_main().await;
                self.stop("기준 페이지로 이동");
                TickOutcome::Redirected
            }
            PageState::TaskShowActive => {
                self.stop("작업 진행 중");
                TickOutcome::TaskActive
            }
            PageState::IncompleteTasksPending => {
                if self
                    .session
                    .as_ref()
                    .is_some_and(|s| s.incomplete_tasks_acknowledged)
                {
                    return TickOutcome::Waiting;
                }
                self.enter_awaiting_decision().await;
                TickOutcome::AwaitingDecision
            }
            PageState::MainPageIdle => self.refresh_main().await,
            PageState::MainPageTaskAvailable => self.handle_available_task(&snapshot).await,
            PageState::Unknown => {
                if self.classifier.is_main_url(&snapshot.url) {
                    TickOutcome::Waiting
                } else {
                    self.stop("기준 페이지를 벗어남");
                    TickOutcome::NavigatedAway
                }
            }
        }
    }

    /// 미완료 작업 안내에 대한 사용자 응답
    pub async fn user_decision(&mut self, confirmed: bool) -> MonitorState {
        if self.state != MonitorState::AwaitingUserDecision {
            debug!(confirmed, "대기 중인 선택 없음 — 응답 무시");
            return self.state;
        }

        if confirmed {
            let settle = Duration::from_millis(self.config.monitor.decision_settle_ms);
            if !settle.is_zero() {
                tokio::time::sleep(settle).await;
            }
            if self.config.monitor.enabled {
                self.begin_session(true);
                info!("사용자 확인 — 모니터링 재개");
            } else {
                self.state = MonitorState::Stopped;
            }
        } else {
            self.state = MonitorState::Stopped;
            self.config.monitor.enabled = false;
            if let Err(e) = self.store.update_with(|c| c.monitor.enabled = false) {
                warn!("모니터링 비활성 저장 실패: {e}");
            }
            info!("사용자 거절 — 모니터링 비활성화");
        }
        self.state
    }

    /// 설정 변경 반영. 세션은 폐기 후 다시 만들어진다.
    pub async fn settings_changed(&mut self, config: AppConfig) -> MonitorState {
        if config.site != self.config.site {
            debug!(main_url = %config.site.main_url, "사이트 규칙 교체");
            self.classifier.update_site(&config.site);
        }
        self.config = config;

        if !self.config.monitor.enabled {
            self.stop("설정에서 비활성화");
            self.ports.alarm.silence().await;
            return self.state;
        }

        if self.state == MonitorState::AwaitingUserDecision {
            // 사용자 응답 전까지 대기 유지
            return self.state;
        }

        self.start().await
    }

    /// 저장소에서 다시 동기화 (컨텍스트 활성화 시)
    pub async fn resync(&mut self) -> MonitorState {
        let config = self.store.get();
        debug!("저장소에서 설정 재동기화");
        self.settings_changed(config).await
    }

    /// 사용자 입력 감지. 설정에 따라 진행 중인 알람을 멈춘다.
    pub async fn user_activity(&mut self) -> bool {
        if self.config.monitor.mouse_movement_stops_alarm && self.ports.alarm.is_active() {
            self.ports.alarm.silence().await;
            info!("사용자 입력 — 알람 중지");
            return true;
        }
        false
    }

    // ============================================================
    // 내부 동작
    // ============================================================

    fn begin_session(&mut self, incomplete_tasks_acknowledged: bool) {
        self.teardown();
        let interval = self.config.monitor.refresh_interval();
        let timer = self.ports.timer.start(interval);
        let mut session = MonitorSession::new(
            timer,
            self.ports.clock.now(),
            self.carried_last_action.take(),
        );
        session.incomplete_tasks_acknowledged = incomplete_tasks_acknowledged;
        self.session = Some(session);
        self.state = MonitorState::Polling;
        info!(
            ?timer,
            interval_ms = interval.as_millis() as u64,
            "모니터링 시작"
        );
    }

    fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            self.ports.timer.cancel(session.timer);
            self.carried_last_action = session.last_action_at.or(self.carried_last_action);
            debug!(timer = ?session.timer, "세션 해제");
        }
    }

    async fn enter_awaiting_decision(&mut self) {
        self.teardown();
        self.state = MonitorState::AwaitingUserDecision;
        let notice = DecisionNotice {
            title: "미완료 작업".to_string(),
            message: "완료하지 않은 작업이 있습니다. 모니터링을 계속할까요?".to_string(),
        };
        if let Err(e) = self.ports.prompt.present(&notice).await {
            warn!("선택 안내 표시 실패: {e}");
        }
        info!("미완료 작업 안내 — 사용자 응답 대기");
    }

    async fn redirect_to_main(&mut self) {
        let main_url = self.config.site.main_url.clone();
        self.stats.redirects += 1;
        // 리다이렉트도 디바운스 창을 연다
        let now = self.ports.clock.now();
        match self.session.as_mut() {
            Some(session) => session.record_action(now),
            None => self.carried_last_action = Some(now),
        }
        if let Err(e) = self.ports.page.navigate(&main_url).await {
            warn!("기준 페이지 이동 실패: {e}");
        } else {
            info!(url = %main_url, "기준 페이지로 이동");
        }
    }

    async fn refresh_main(&mut self) -> TickOutcome {
        let now = self.ports.clock.now();
        let window = self.config.monitor.debounce_window();
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Ignored;
        };
        if !session.debounce_elapsed(now, window) {
            debug!("디바운스 창 안 — 새로고침 생략");
            return TickOutcome::Debounced;
        }
        session.record_action(now);

        self.stats.refreshes += 1;
        let main_url = self.config.site.main_url.clone();
        if let Err(e) = self.ports.page.navigate(&main_url).await {
            warn!("새로고침 실패: {e}");
        }
        TickOutcome::Refreshed
    }

    async fn handle_available_task(&mut self, snapshot: &PageSnapshot) -> TickOutcome {
        let control = self.classifier.acquire_control(snapshot).cloned();
        let task = extract_task_info(snapshot, control.as_ref());
        self.stats.tasks_seen += 1;

        let now = self.ports.clock.now().naive_local();
        let decision = filter::evaluate(&task, &self.config.monitor.filters, now);
        if !decision.accepted() {
            self.stats.tasks_rejected += 1;
            info!(
                task_type = %task.task_type,
                reward = task.reward_dollars,
                rejected_by = ?decision.rejected_by,
                "필터에 걸린 작업 — 폴링 유지"
            );
            return TickOutcome::TaskRejected(task);
        }

        self.stats.tasks_accepted += 1;
        self.stop("작업 발견");
        info!(
            task_type = %task.task_type,
            duration_min = task.duration_minutes,
            reward = task.reward_dollars,
            mode = ?self.config.monitor.mode,
            "작업 수락"
        );

        let activation = match self.config.monitor.mode {
            MonitorMode::AlarmOnly => None,
            MonitorMode::AlarmAndClick => {
                self.stats.activations += 1;
                let path = match control.as_ref() {
                    Some(control) => self.activate(control).await,
                    None => {
                        warn!("획득 컨트롤이 사라짐 — 활성화 생략");
                        ActivationPath::Failed
                    }
                };
                let delay = Duration::from_millis(self.config.monitor.acquire_alarm_delay_ms);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Some(path)
            }
        };

        self.stats.alarms += 1;
        let alarm = self.ports.alarm.raise(&self.alarm_request(&task)).await;

        TickOutcome::TaskAccepted {
            task,
            activation,
            alarm,
        }
    }

    /// 직접 호출 → 합성 클릭 → (링크면) 직접 이동 순으로 시도
    async fn activate(&self, control: &PageControl) -> ActivationPath {
        match self.ports.page.invoke(control).await {
            Ok(()) => return ActivationPath::Invoked,
            Err(e) => debug!("직접 호출 실패, 합성 클릭 시도: {e}"),
        }
        match self.ports.page.dispatch_click(control).await {
            Ok(()) => return ActivationPath::SyntheticClick,
            Err(e) => debug!("합성 클릭 실패: {e}"),
        }
        if control.kind == ControlKind::Link {
            if let Some(href) = control.href.as_deref() {
                match self.ports.page.navigate(href).await {
                    Ok(()) => return ActivationPath::Navigated,
                    Err(e) => warn!("링크 이동 실패: {e}"),
                }
            }
        }
        warn!(label = %control.label, "획득 컨트롤 활성화 실패");
        ActivationPath::Failed
    }

    fn alarm_request(&self, task: &TaskInfo) -> AlarmRequest {
        let monitor = &self.config.monitor;
        let notice = monitor.desktop_notifications_enabled.then(|| AlarmNotice {
            title: "새 작업 발견".to_string(),
            body: format!(
                "{} · 약 {:.0}분 · ${:.2}",
                task.task_type, task.duration_minutes, task.reward_dollars
            ),
        });
        AlarmRequest {
            sound: monitor.alert_sound.clone(),
            options: PlaybackOptions {
                volume: self.config.alarm.volume,
                looped: self.config.alarm.looped,
            },
            tone: ToneSpec::from(&self.config.alarm),
            notice,
        }
    }
}
