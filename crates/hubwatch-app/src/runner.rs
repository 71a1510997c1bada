//! 모니터 러너.
//!
//! 제어기를 독점 소유하는 단일 태스크. 아래 입력을 하나씩 처리한다.
//!
//! - 타이머 틱 → `on_tick` (리다이렉트 후에는 새 페이지 로드처럼 `start`)
//! - 설정 변경(watch) → 전파 + `settings_changed`
//! - 설정 파일 주기적 재로드 → 다른 프로세스에서 바꾼 설정 반영
//! - 콘솔 명령 → 사용자 응답/활동/시작/정지
//! - 종료 신호
//!
//! 상태가 바뀔 때마다 모든 화면/탭에 `MonitorStateChanged`를 전파한다.

use hubwatch_core::config::AppConfig;
use hubwatch_core::config_manager::SettingsStore;
use hubwatch_core::models::event::BroadcastEvent;
use hubwatch_core::models::monitor::MonitorState;
use hubwatch_core::ports::timer::TimerHandle;
use hubwatch_monitor::controller::{MonitorController, TickOutcome};
use hubwatch_monitor::stats::MonitorStats;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::dispatcher::NotificationDispatcher;

/// 설정 파일 재로드 기본 간격
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(2);

/// 러너 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerCommand {
    /// 미완료 작업 안내 응답
    Decision(bool),
    /// 사용자 입력 감지
    UserActivity,
    /// 저장소 기준으로 다시 동기화
    Resync,
    /// 모니터링 시작
    Start,
    /// 모니터링 정지
    Stop,
    /// 통계 출력
    Stats,
}

/// 러너 입력 채널 묶음
pub struct RunnerInputs {
    pub ticks: mpsc::UnboundedReceiver<TimerHandle>,
    pub commands: mpsc::Receiver<RunnerCommand>,
    pub shutdown: watch::Receiver<bool>,
}

/// 모니터 러너
pub struct MonitorRunner {
    controller: MonitorController,
    dispatcher: NotificationDispatcher,
    store: SettingsStore,
    reload_interval: Duration,
    published_state: Option<MonitorState>,
}

impl MonitorRunner {
    pub fn new(
        controller: MonitorController,
        dispatcher: NotificationDispatcher,
        store: SettingsStore,
    ) -> Self {
        Self {
            controller,
            dispatcher,
            store,
            reload_interval: DEFAULT_RELOAD_INTERVAL,
            published_state: None,
        }
    }

    /// 설정 파일 재로드 간격 변경
    pub fn with_reload_interval(mut self, interval: Duration) -> Self {
        self.reload_interval = interval;
        self
    }

    /// 종료 신호까지 실행. 종료 시 누적 통계 반환.
    pub async fn run(mut self, inputs: RunnerInputs) -> MonitorStats {
        let RunnerInputs {
            mut ticks,
            mut commands,
            mut shutdown,
        } = inputs;
        let mut settings = self.store.subscribe();

        let mut reload = tokio::time::interval(self.reload_interval);
        reload.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        reload.tick().await;

        info!(reload_ms = self.reload_interval.as_millis() as u64, "러너 시작");
        self.controller.start().await;
        self.publish_state().await;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                Some(handle) = ticks.recv() => {
                    self.handle_tick(handle).await;
                }
                changed = settings.changed() => {
                    if changed.is_err() {
                        warn!("설정 채널 닫힘");
                        break;
                    }
                    let config = settings.borrow_and_update().clone();
                    self.handle_settings(config).await;
                }
                _ = reload.tick() => {
                    match self.store.reload() {
                        Ok(true) => debug!("설정 파일 변경 감지"),
                        Ok(false) => {}
                        Err(e) => warn!("설정 파일 재로드 실패: {e}"),
                    }
                }
                Some(command) = commands.recv() => {
                    self.handle_command(command).await;
                }
            }

            self.publish_state().await;
        }

        self.controller.stop("러너 종료");
        self.publish_state().await;
        let stats = self.controller.stats();
        info!(?stats, "러너 종료");
        stats
    }

    async fn handle_tick(&mut self, handle: TimerHandle) {
        let outcome = self.controller.on_tick(handle).await;
        match &outcome {
            TickOutcome::Ignored | TickOutcome::Debounced | TickOutcome::Waiting => {
                debug!(?outcome, "틱 처리");
            }
            TickOutcome::Redirected => {
                info!("기준 페이지로 이동 — 새 페이지에서 다시 시작");
                self.controller.start().await;
            }
            TickOutcome::TaskAccepted { task, activation, alarm } => {
                info!(
                    task_type = %task.task_type,
                    ?activation,
                    ?alarm,
                    "작업 발견 처리 완료"
                );
            }
            other => debug!(outcome = ?other, "틱 처리"),
        }
    }

    async fn handle_settings(&mut self, config: AppConfig) {
        let previous_theme = self.controller.config().ui.theme;
        self.dispatcher.settings_changed(&config).await;
        if config.ui.theme != previous_theme {
            self.dispatcher
                .broadcast(&BroadcastEvent::ThemeChanged(config.ui.theme))
                .await;
        }
        info!(enabled = config.monitor.enabled, "설정 변경 반영");
        self.controller.settings_changed(config).await;
    }

    async fn handle_command(&mut self, command: RunnerCommand) {
        debug!(?command, "러너 명령");
        match command {
            RunnerCommand::Decision(confirmed) => {
                self.controller.user_decision(confirmed).await;
            }
            RunnerCommand::UserActivity => {
                self.controller.user_activity().await;
            }
            RunnerCommand::Resync => {
                self.controller.resync().await;
            }
            RunnerCommand::Start => {
                if let Err(e) = self.store.update_with(|c| c.monitor.enabled = true) {
                    warn!("모니터링 활성화 저장 실패: {e}");
                }
            }
            RunnerCommand::Stop => {
                if let Err(e) = self.store.update_with(|c| c.monitor.enabled = false) {
                    warn!("모니터링 비활성화 저장 실패: {e}");
                }
            }
            RunnerCommand::Stats => {
                let stats = self.controller.stats();
                println!(
                    "상태: {} | 틱 {} · 새로고침 {} · 리다이렉트 {} · 발견 {} (수락 {}, 거절 {}) · 알람 {}",
                    self.controller.state(),
                    stats.ticks,
                    stats.refreshes,
                    stats.redirects,
                    stats.tasks_seen,
                    stats.tasks_accepted,
                    stats.tasks_rejected,
                    stats.alarms
                );
            }
        }
    }

    async fn publish_state(&mut self) {
        let state = self.controller.state();
        if self.published_state == Some(state) {
            return;
        }
        self.published_state = Some(state);
        info!(%state, "모니터 상태");
        self.dispatcher.monitor_state_changed(state).await;
    }
}
