//! # hubwatch
//!
//! 작업 대기열 페이지를 주기적으로 확인하고, 조건에 맞는 작업이 보이면
//! 알람을 울리는(선택적으로 바로 획득하는) 터미널 모니터.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hubwatch_alarm::output::TerminalBellOutput;
use hubwatch_alarm::player::AlarmPlayer;
use hubwatch_app::dispatcher::NotificationDispatcher;
use hubwatch_app::event_bus::LocalBus;
use hubwatch_app::lifecycle::LifecycleManager;
use hubwatch_app::prompt::{read_console, ConsolePrompt};
use hubwatch_app::runner::{MonitorRunner, RunnerInputs};
use hubwatch_app::ticker::TokioPollTimer;
use hubwatch_core::config::{AppConfig, MonitorMode};
use hubwatch_core::config_manager::SettingsStore;
use hubwatch_core::models::page::PageState;
use hubwatch_core::ports::alarm::{Alarm, AlarmNotice, AlarmRequest, ToneSpec};
use hubwatch_core::ports::audio::{AudioOutput, PlaybackOptions};
use hubwatch_core::ports::clock::SystemClock;
use hubwatch_core::ports::page::PageInspector;
use hubwatch_monitor::classifier::{PageClassifier, RuleClassifier};
use hubwatch_monitor::controller::{MonitorController, MonitorPorts};
use hubwatch_monitor::extractor::extract_task_info;
use hubwatch_monitor::filter;
use hubwatch_network::http_page::HttpPage;
use hubwatch_network::sound_fetch::HttpSoundFetcher;
use hubwatch_ui::notifier::DesktopNotifierImpl;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 작업 대기열 모니터
#[derive(Parser, Debug)]
#[command(name = "hubwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 모니터링 실행 (기본)
    Run(RunArgs),
    /// 페이지를 한 번 읽어 분류 결과 출력
    Classify {
        /// 읽을 URL (기본: 설정의 main_url)
        url: Option<String>,
    },
    /// 설정 조회/변경
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// 알람 시험 재생
    TestAlarm {
        /// 재생 유지 시간 (초)
        #[arg(long, default_value = "3")]
        seconds: u64,
    },
}

#[derive(clap::Args, Debug, Default)]
struct RunArgs {
    /// 시작 URL (기본: 설정의 main_url)
    #[arg(long)]
    url: Option<String>,

    /// 동작 모드 (저장됨)
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// 새로고침 간격 초 (저장됨, 최소 0.5)
    #[arg(long)]
    interval: Option<f64>,

    /// 모니터링 활성화 (저장됨)
    #[arg(long)]
    enable: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// 현재 설정 출력 (JSON)
    Show,
    /// 설정 파일 경로 출력
    Path,
    /// 점 경로로 값 변경 (예: `monitor.filters.min_reward 0.05`)
    Set { key: String, value: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    AlarmOnly,
    AlarmAndClick,
}

impl From<ModeArg> for MonitorMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::AlarmOnly => MonitorMode::AlarmOnly,
            ModeArg::AlarmAndClick => MonitorMode::AlarmAndClick,
        }
    }
}

fn open_store(path: Option<PathBuf>) -> Result<SettingsStore> {
    let store = match path {
        Some(path) => SettingsStore::with_path(path)?,
        None => SettingsStore::new()?,
    };
    debug!(path = %store.config_path().display(), "설정 저장소 열림");
    Ok(store)
}

/// 오디오 출력 선택 (rodio feature가 있으면 스피커, 실패 시 터미널 벨)
fn audio_output() -> Arc<dyn AudioOutput> {
    #[cfg(feature = "rodio")]
    {
        match hubwatch_alarm::output::RodioOutput::new() {
            Ok(output) => return Arc::new(output),
            Err(e) => tracing::warn!("스피커 출력 초기화 실패, 터미널 벨 사용: {e}"),
        }
    }
    Arc::new(TerminalBellOutput::new())
}

fn build_alarm(config: &AppConfig) -> Result<Arc<AlarmPlayer>> {
    let fetcher = HttpSoundFetcher::new(config.site.request_timeout())?;
    let player = AlarmPlayer::new(audio_output())
        .with_fetcher(Arc::new(fetcher))
        .with_notifier(Arc::new(DesktopNotifierImpl::new()));
    Ok(Arc::new(player))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!(
        "hubwatch={0},hubwatch_app={0},hubwatch_core={0},hubwatch_monitor={0},hubwatch_alarm={0},hubwatch_network={0},hubwatch_ui={0}",
        cli.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let store = open_store(cli.config)?;

    match cli.command.unwrap_or(Command::Run(RunArgs::default())) {
        Command::Run(args) => run(store, args).await,
        Command::Classify { url } => classify(store, url).await,
        Command::Config { action } => config_command(store, action),
        Command::TestAlarm { seconds } => test_alarm(store, seconds).await,
    }
}

async fn run(store: SettingsStore, args: RunArgs) -> Result<()> {
    if args.mode.is_some() || args.interval.is_some() || args.enable {
        store
            .update_with(|c| {
                if let Some(mode) = args.mode {
                    c.monitor.mode = mode.into();
                }
                if let Some(interval) = args.interval {
                    c.monitor.refresh_interval_seconds = interval;
                }
                if args.enable {
                    c.monitor.enabled = true;
                }
            })
            .context("명령줄 설정 저장 실패")?;
    }

    let config = store.get();
    let start_url = args.url.unwrap_or_else(|| config.site.main_url.clone());
    info!(
        url = %start_url,
        enabled = config.monitor.enabled,
        mode = ?config.monitor.mode,
        interval_s = config.monitor.refresh_interval_seconds,
        "hubwatch 시작"
    );
    if !config.monitor.enabled {
        println!("모니터링이 꺼져 있습니다. `start` 입력 또는 `hubwatch run --enable`로 켤 수 있습니다.");
    }

    // ── 어댑터 ──
    let page = Arc::new(HttpPage::new(&config.site, &start_url)?);
    let (timer, ticks) = TokioPollTimer::new();
    let alarm = build_alarm(&config)?;

    let ports = MonitorPorts {
        page,
        timer: Arc::new(timer),
        alarm,
        prompt: Arc::new(ConsolePrompt),
        clock: Arc::new(SystemClock),
    };
    let classifier = Box::new(RuleClassifier::new(config.site.clone()));
    let controller = MonitorController::new(ports, classifier, store.clone());

    // ── 메시징 ──
    let bus = Arc::new(LocalBus::default());
    let mut surface = bus.subscribe_surface();
    tokio::spawn(async move {
        while let Ok(event) = surface.recv().await {
            debug!(kind = event.kind(), "화면 이벤트 수신");
        }
    });
    let mut tab = bus.register_tab(&start_url);
    tokio::spawn(async move {
        while let Some(event) = tab.recv().await {
            debug!(kind = event.kind(), "탭 이벤트 수신");
        }
    });
    let dispatcher = NotificationDispatcher::new(bus.clone(), config.site.tab_pattern.clone());

    // ── 라이프사이클 ──
    let lifecycle = Arc::new(LifecycleManager::new());
    let signal_lifecycle = lifecycle.clone();
    tokio::spawn(async move {
        signal_lifecycle.wait_for_signal().await;
    });

    let (command_tx, command_rx) = mpsc::channel(16);
    let console_lifecycle = lifecycle.clone();
    tokio::spawn(async move {
        if read_console(command_tx).await {
            console_lifecycle.shutdown();
        }
    });

    println!("입력: [Enter] 알람 중지 · y/n 응답 · start/stop/resync/stats · q 종료");

    let runner = MonitorRunner::new(controller, dispatcher, store);
    let stats = runner
        .run(RunnerInputs {
            ticks,
            commands: command_rx,
            shutdown: lifecycle.subscribe(),
        })
        .await;

    println!("{}", serde_json::to_string_pretty(&stats)?);
    info!("hubwatch 종료");
    Ok(())
}

async fn classify(store: SettingsStore, url: Option<String>) -> Result<()> {
    let config = store.get();
    let url = url.unwrap_or_else(|| config.site.main_url.clone());
    let page = HttpPage::new(&config.site, &url)?;
    let snapshot = page
        .snapshot()
        .await
        .with_context(|| format!("페이지 읽기 실패: {url}"))?;

    let classifier = RuleClassifier::new(config.site.clone());
    let state = classifier.classify(&snapshot);
    println!("URL:    {}", snapshot.url);
    println!("상태:   {}", serde_json::to_string(&state)?);
    println!("컨트롤: {}개", snapshot.controls.len());

    if state == PageState::MainPageTaskAvailable {
        let control = classifier.acquire_control(&snapshot);
        let task = extract_task_info(&snapshot, control);
        let now = chrono::Local::now().naive_local();
        let decision = filter::evaluate(&task, &config.monitor.filters, now);
        println!("작업:   {}", serde_json::to_string(&task)?);
        println!("필터:   {}", serde_json::to_string(&decision)?);
    }
    Ok(())
}

fn config_command(store: SettingsStore, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&store.get())?);
        }
        ConfigAction::Path => {
            println!("{}", store.config_path().display());
        }
        ConfigAction::Set { key, value } => {
            let updated = store
                .set_path(&key, &value)
                .with_context(|| format!("설정 변경 실패: {key}"))?;
            info!(key = %key, "설정 변경 저장");
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
    }
    Ok(())
}

async fn test_alarm(store: SettingsStore, seconds: u64) -> Result<()> {
    let config = store.get();
    let alarm = build_alarm(&config)?;
    let request = AlarmRequest {
        sound: config.monitor.alert_sound.clone(),
        options: PlaybackOptions {
            volume: config.alarm.volume,
            looped: config.alarm.looped,
        },
        tone: ToneSpec::from(&config.alarm),
        notice: config.monitor.desktop_notifications_enabled.then(|| AlarmNotice {
            title: "알람 시험".to_string(),
            body: "hubwatch 알람이 정상 동작합니다.".to_string(),
        }),
    };

    let outcome = alarm.raise(&request).await;
    println!("재생 단계: {outcome:?} (출력: {})", alarm.output_name());
    tokio::time::sleep(Duration::from_secs(seconds)).await;
    alarm.silence().await;
    Ok(())
}
