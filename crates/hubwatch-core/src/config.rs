//! 애플리케이션 설정 구조체.
//!
//! 모니터링 동작, 알림음, 작업 필터, 대상 사이트 규칙, 알람/UI 설정을 정의한다.
//! `SettingsStore`를 통해 JSON 파일에서 로드/저장된다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::CoreError;

/// 자동 새로고침 사이 최소 간격 (초)
pub const MIN_DEBOUNCE_SECS: f64 = 2.0;

/// 새로고침 간격 하한 (초)
pub const MIN_REFRESH_INTERVAL_SECS: f64 = 0.5;

/// 새로고침 간격/디바운스 상한 (초, 하루)
pub const MAX_INTERVAL_SECS: f64 = 86_400.0;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 모니터링 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 대상 사이트 규칙
    #[serde(default)]
    pub site: SiteConfig,
    /// 알람 재생 설정
    #[serde(default)]
    pub alarm: AlarmConfig,
    /// 화면 테마 등 UI 설정
    #[serde(default)]
    pub ui: UiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

// ============================================================
// 모니터링 설정
// ============================================================

/// 작업 발견 시 동작 모드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorMode {
    /// 알람만 울림
    #[default]
    AlarmOnly,
    /// 작업 획득 컨트롤 클릭 + 알람
    AlarmAndClick,
}

/// 알림음 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundKind {
    /// 내장 기본음
    #[default]
    Default,
    /// 사용자 파일 (data URI)
    File,
    /// 원격 URL
    Url,
}

/// 알림음 설정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSound {
    /// 음원 종류
    #[serde(default)]
    pub kind: SoundKind,
    /// 음원 데이터 (File: data URI, Url: 주소)
    #[serde(default)]
    pub data: String,
}

/// 모니터링 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 모니터링 활성화 여부
    #[serde(default)]
    pub enabled: bool,
    /// 작업 발견 시 동작 모드
    #[serde(default)]
    pub mode: MonitorMode,
    /// 페이지 확인 주기 (초)
    #[serde(default = "default_refresh_interval_seconds")]
    pub refresh_interval_seconds: f64,
    /// 알림음
    #[serde(default)]
    pub alert_sound: AlertSound,
    /// 데스크톱 알림 표시 여부
    #[serde(default = "default_true")]
    pub desktop_notifications_enabled: bool,
    /// 사용자 입력 시 알람 중지
    #[serde(default)]
    pub mouse_movement_stops_alarm: bool,
    /// 클릭 시도와 알람 사이 지연 (밀리초)
    #[serde(default = "default_acquire_alarm_delay_ms")]
    pub acquire_alarm_delay_ms: u64,
    /// 미완료 작업 확인 후 모니터링 재개까지 대기 (밀리초)
    #[serde(default = "default_decision_settle_ms")]
    pub decision_settle_ms: u64,
    /// 자동 새로고침 최소 간격 (초)
    #[serde(default = "default_debounce_seconds")]
    pub debounce_seconds: f64,
    /// 작업 필터
    #[serde(default)]
    pub filters: FilterConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: MonitorMode::default(),
            refresh_interval_seconds: default_refresh_interval_seconds(),
            alert_sound: AlertSound::default(),
            desktop_notifications_enabled: true,
            mouse_movement_stops_alarm: false,
            acquire_alarm_delay_ms: default_acquire_alarm_delay_ms(),
            decision_settle_ms: default_decision_settle_ms(),
            debounce_seconds: default_debounce_seconds(),
            filters: FilterConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// 폴링 주기를 Duration으로 반환
    pub fn refresh_interval(&self) -> Duration {
        let secs = self
            .refresh_interval_seconds
            .clamp(MIN_REFRESH_INTERVAL_SECS, MAX_INTERVAL_SECS);
        Duration::try_from_secs_f64(secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_refresh_interval_seconds()))
    }

    /// 새로고침 디바운스 창 (2초 미만으로 내려가지 않음)
    pub fn debounce_window(&self) -> Duration {
        let secs = self.debounce_seconds.clamp(MIN_DEBOUNCE_SECS, MAX_INTERVAL_SECS);
        Duration::try_from_secs_f64(secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(MIN_DEBOUNCE_SECS))
    }
}

// ============================================================
// 작업 필터
// ============================================================

/// 시간대 필터 (HH:MM, 양끝 포함)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_time_start")]
    pub start: String,
    #[serde(default = "default_time_end")]
    pub end: String,
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            enabled: false,
            start: default_time_start(),
            end: default_time_end(),
        }
    }
}

/// 사용자 정의 필터 규칙
///
/// 필드/연산자는 문자열로 보관한다. 알 수 없는 값은 평가 시 통과 처리된다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    /// 대상 필드 (type, duration, reward)
    pub field: String,
    /// 연산자 (equals, contains, greater_than ...)
    pub operator: String,
    /// 비교 값
    pub value: String,
}

/// 작업 필터 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// 허용 작업 유형 (비어 있으면 전체 허용)
    #[serde(default)]
    pub task_types: BTreeSet<String>,
    /// 최소 소요 시간 (분, 0이면 제한 없음)
    #[serde(default)]
    pub min_duration_minutes: u32,
    /// 최대 소요 시간 (분, 0이면 제한 없음)
    #[serde(default)]
    pub max_duration_minutes: u32,
    /// 허용 시간대
    #[serde(default)]
    pub time_range: TimeRange,
    /// 허용 요일 (ISO 1=월 … 7=일)
    #[serde(default = "default_days_of_week")]
    pub days_of_week: BTreeSet<u8>,
    /// 최소 보상 (달러)
    #[serde(default)]
    pub min_reward: f64,
    /// 사용자 정의 규칙 (순서대로 평가)
    #[serde(default)]
    pub custom_rules: Vec<CustomRule>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            task_types: BTreeSet::new(),
            min_duration_minutes: 0,
            max_duration_minutes: 0,
            time_range: TimeRange::default(),
            days_of_week: default_days_of_week(),
            min_reward: 0.0,
            custom_rules: Vec::new(),
        }
    }
}

impl FilterConfig {
    /// 모든 필터가 기본값(비활성)인지 확인
    pub fn is_disabled(&self) -> bool {
        self.task_types.is_empty()
            && self.min_duration_minutes == 0
            && self.max_duration_minutes == 0
            && !self.time_range.enabled
            && self.covers_all_days()
            && self.min_reward <= 0.0
            && self.custom_rules.is_empty()
    }

    /// 요일 필터가 사실상 비활성인지 (비었거나 7일 전체)
    pub fn covers_all_days(&self) -> bool {
        self.days_of_week.is_empty() || (1..=7).all(|d| self.days_of_week.contains(&d))
    }
}

/// "HH:MM" 문자열을 자정 이후 분으로 변환. 형식 오류 시 None.
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (h, m) = value.trim().split_once(':')?;
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    if hours > 23 || minutes > 59 || m.len() != 2 {
        return None;
    }
    Some(hours * 60 + minutes)
}

// ============================================================
// 대상 사이트 규칙
// ============================================================

/// 대상 사이트 URL/마커 규칙
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// 모니터링 기준 페이지 (작업 대기열)
    #[serde(default = "default_main_url")]
    pub main_url: String,
    /// 작업 목록 페이지
    #[serde(default = "default_task_index_url")]
    pub task_index_url: String,
    /// 작업 상세 페이지 경로 조각
    #[serde(default = "default_task_show_path")]
    pub task_show_path: String,
    /// 작업 상세 페이지의 작업 ID 쿼리 파라미터
    #[serde(default = "default_task_id_param")]
    pub task_id_param: String,
    /// 작업 획득 링크의 토큰 쿼리 파라미터
    #[serde(default = "default_acquire_token_param")]
    pub acquire_token_param: String,
    /// "작업 없음" 문구
    #[serde(default = "default_no_tasks_markers")]
    pub no_tasks_markers: Vec<String>,
    /// 제출 완료/접근 거부 문구
    #[serde(default = "default_forbidden_markers")]
    pub forbidden_markers: Vec<String>,
    /// 미완료 작업 안내 문구
    #[serde(default = "default_incomplete_tasks_marker")]
    pub incomplete_tasks_marker: String,
    /// 미완료 작업 계속 버튼 라벨
    #[serde(default = "default_continue_label")]
    pub continue_label: String,
    /// 요청에 첨부할 세션 쿠키 (로그인 세션)
    #[serde(default)]
    pub session_cookie: Option<String>,
    /// HTTP 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// 변경 이벤트를 전달할 탭 URL 패턴
    #[serde(default = "default_tab_pattern")]
    pub tab_pattern: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            main_url: default_main_url(),
            task_index_url: default_task_index_url(),
            task_show_path: default_task_show_path(),
            task_id_param: default_task_id_param(),
            acquire_token_param: default_acquire_token_param(),
            no_tasks_markers: default_no_tasks_markers(),
            forbidden_markers: default_forbidden_markers(),
            incomplete_tasks_marker: default_incomplete_tasks_marker(),
            continue_label: default_continue_label(),
            session_cookie: None,
            request_timeout_ms: default_request_timeout_ms(),
            tab_pattern: default_tab_pattern(),
        }
    }
}

impl SiteConfig {
    /// HTTP 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ============================================================
// 알람 / UI 설정
// ============================================================

/// 알람 재생 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// 볼륨 (0.0 ~ 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// 중지될 때까지 반복 재생
    #[serde(default)]
    pub looped: bool,
    /// 최후 수단 비프음 주파수 (Hz)
    #[serde(default = "default_tone_frequency_hz")]
    pub tone_frequency_hz: f32,
    /// 최후 수단 비프음 길이 (밀리초)
    #[serde(default = "default_tone_duration_ms")]
    pub tone_duration_ms: u64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            looped: false,
            tone_frequency_hz: default_tone_frequency_hz(),
            tone_duration_ms: default_tone_duration_ms(),
        }
    }
}

/// 화면 테마
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// UI 설정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: Theme,
}

// ============================================================
// AppConfig
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            site: SiteConfig::default(),
            alarm: AlarmConfig::default(),
            ui: UiConfig::default(),
        }
    }

    /// 설정 불변식 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        let monitor = &self.monitor;
        let refresh_range = MIN_REFRESH_INTERVAL_SECS..=MAX_INTERVAL_SECS;
        if !refresh_range.contains(&monitor.refresh_interval_seconds) {
            return Err(CoreError::validation(
                "monitor.refresh_interval_seconds",
                format!("{MIN_REFRESH_INTERVAL_SECS} ~ {MAX_INTERVAL_SECS}초 범위여야 합니다"),
            ));
        }
        if !(0.0..=MAX_INTERVAL_SECS).contains(&monitor.debounce_seconds) {
            return Err(CoreError::validation(
                "monitor.debounce_seconds",
                format!("0 ~ {MAX_INTERVAL_SECS}초 범위여야 합니다"),
            ));
        }

        let filters = &monitor.filters;
        if filters.min_duration_minutes > 0
            && filters.max_duration_minutes > 0
            && filters.min_duration_minutes > filters.max_duration_minutes
        {
            return Err(CoreError::validation(
                "monitor.filters.min_duration_minutes",
                "최소 소요 시간이 최대 소요 시간보다 큽니다",
            ));
        }
        if let Some(day) = filters.days_of_week.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(CoreError::validation(
                "monitor.filters.days_of_week",
                format!("요일은 1~7 범위여야 합니다: {day}"),
            ));
        }
        if filters.time_range.enabled {
            for (field, value) in [
                ("monitor.filters.time_range.start", &filters.time_range.start),
                ("monitor.filters.time_range.end", &filters.time_range.end),
            ] {
                if parse_hhmm(value).is_none() {
                    return Err(CoreError::validation(
                        field,
                        format!("HH:MM 형식이 아닙니다: {value}"),
                    ));
                }
            }
        }
        if filters.min_reward < 0.0 || !filters.min_reward.is_finite() {
            return Err(CoreError::validation(
                "monitor.filters.min_reward",
                "0 이상의 값이어야 합니다",
            ));
        }

        for (field, value) in [
            ("site.main_url", &self.site.main_url),
            ("site.task_index_url", &self.site.task_index_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| CoreError::validation(field, format!("URL 파싱 실패: {e}")))?;
        }

        if !(0.0..=1.0).contains(&self.alarm.volume) {
            return Err(CoreError::validation(
                "alarm.volume",
                "0.0 ~ 1.0 범위여야 합니다",
            ));
        }

        Ok(())
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}
fn default_refresh_interval_seconds() -> f64 {
    5.0
}
fn default_acquire_alarm_delay_ms() -> u64 {
    75
}
fn default_decision_settle_ms() -> u64 {
    1_000
}
fn default_debounce_seconds() -> f64 {
    MIN_DEBOUNCE_SECS
}
fn default_time_start() -> String {
    "00:00".to_string()
}
fn default_time_end() -> String {
    "23:59".to_string()
}
fn default_days_of_week() -> BTreeSet<u8> {
    (1..=7).collect()
}
fn default_main_url() -> String {
    "https://www.raterhub.com/evaluation/rater".to_string()
}
fn default_task_index_url() -> String {
    "https://www.raterhub.com/evaluation/rater/task/index".to_string()
}
fn default_task_show_path() -> String {
    "/task/show".to_string()
}
fn default_task_id_param() -> String {
    "taskIds".to_string()
}
fn default_acquire_token_param() -> String {
    "acquireToken".to_string()
}
fn default_no_tasks_markers() -> Vec<String> {
    vec![
        "No tasks are currently available".to_string(),
        "no tasks available".to_string(),
    ]
}
fn default_forbidden_markers() -> Vec<String> {
    vec![
        "Error 403".to_string(),
        "403 Forbidden".to_string(),
        "already been submitted".to_string(),
        "task was already submitted".to_string(),
    ]
}
fn default_incomplete_tasks_marker() -> String {
    "Incomplete tasks".to_string()
}
fn default_continue_label() -> String {
    "Continue".to_string()
}
fn default_request_timeout_ms() -> u64 {
    15_000
}
fn default_tab_pattern() -> String {
    "https://www.raterhub.com/*".to_string()
}
fn default_volume() -> f32 {
    0.8
}
fn default_tone_frequency_hz() -> f32 {
    880.0
}
fn default_tone_duration_ms() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default_config();
        assert!(config.validate().is_ok());
        assert!(!config.monitor.enabled);
        assert_eq!(config.monitor.mode, MonitorMode::AlarmOnly);
        assert!(config.monitor.filters.is_disabled());
    }

    #[test]
    fn refresh_interval_lower_bound() {
        let mut config = AppConfig::default_config();
        config.monitor.refresh_interval_seconds = 0.4;
        assert!(config.validate().is_err());

        config.monitor.refresh_interval_seconds = 0.5;
        assert!(config.validate().is_ok());
        assert_eq!(config.monitor.refresh_interval().as_millis(), 500);
    }

    #[test]
    fn huge_or_infinite_intervals_rejected() {
        for value in [1e20, f64::INFINITY, f64::NAN, MAX_INTERVAL_SECS + 1.0] {
            let mut config = AppConfig::default_config();
            config.monitor.refresh_interval_seconds = value;
            assert!(config.validate().is_err(), "refresh {value}");

            let mut config = AppConfig::default_config();
            config.monitor.debounce_seconds = value;
            assert!(config.validate().is_err(), "debounce {value}");
        }

        let mut config = AppConfig::default_config();
        config.monitor.refresh_interval_seconds = MAX_INTERVAL_SECS;
        config.monitor.debounce_seconds = MAX_INTERVAL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unvalidated_intervals_never_panic() {
        let mut monitor = MonitorConfig::default();
        monitor.refresh_interval_seconds = 1e20;
        monitor.debounce_seconds = f64::INFINITY;
        assert_eq!(monitor.refresh_interval(), Duration::from_secs(86_400));
        assert_eq!(monitor.debounce_window(), Duration::from_secs(86_400));

        monitor.refresh_interval_seconds = f64::NAN;
        monitor.debounce_seconds = f64::NAN;
        assert_eq!(monitor.refresh_interval(), Duration::from_secs(5));
        assert_eq!(monitor.debounce_window(), Duration::from_secs(2));

        monitor.refresh_interval_seconds = -3.0;
        assert_eq!(monitor.refresh_interval(), Duration::from_millis(500));
    }

    #[test]
    fn duration_range_must_be_ordered() {
        let mut config = AppConfig::default_config();
        config.monitor.filters.min_duration_minutes = 10;
        config.monitor.filters.max_duration_minutes = 5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_duration_minutes"));

        // 한쪽만 설정된 경우는 허용
        config.monitor.filters.max_duration_minutes = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_day_and_time_rejected() {
        let mut config = AppConfig::default_config();
        config.monitor.filters.days_of_week.insert(8);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default_config();
        config.monitor.filters.time_range = TimeRange {
            enabled: true,
            start: "9:00".to_string(),
            end: "25:00".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn debounce_window_never_below_two_seconds() {
        let mut monitor = MonitorConfig::default();
        monitor.debounce_seconds = 0.5;
        assert_eq!(monitor.debounce_window(), Duration::from_secs(2));
        monitor.debounce_seconds = 3.0;
        assert_eq!(monitor.debounce_window(), Duration::from_secs(3));
    }

    #[test]
    fn parse_hhmm_values() {
        assert_eq!(parse_hhmm("00:00"), Some(0));
        assert_eq!(parse_hhmm("09:30"), Some(570));
        assert_eq!(parse_hhmm("9:30"), Some(570));
        assert_eq!(parse_hhmm("23:59"), Some(1439));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("12:5"), None);
        assert_eq!(parse_hhmm("noon"), None);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let json = r#"{"monitor":{"enabled":true,"mode":"alarm_and_click"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert!(config.monitor.enabled);
        assert_eq!(config.monitor.mode, MonitorMode::AlarmAndClick);
        assert_eq!(config.monitor.refresh_interval_seconds, 5.0);
        assert_eq!(config.site.acquire_token_param, "acquireToken");
        assert_eq!(config.monitor.filters.days_of_week.len(), 7);
    }

    #[test]
    fn all_days_or_empty_counts_as_disabled() {
        let mut filters = FilterConfig::default();
        filters.days_of_week.clear();
        assert!(filters.is_disabled());
        filters.days_of_week.insert(1);
        assert!(!filters.is_disabled());
    }
}
