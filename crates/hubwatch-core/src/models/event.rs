//! 컨텍스트 간 브로드캐스트 이벤트.

use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, Theme};
use crate::models::monitor::MonitorState;

/// 모든 화면/탭에 전달되는 변경 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum BroadcastEvent {
    /// 설정 변경 (전체 설정 포함)
    SettingsChanged(Box<AppConfig>),
    /// 테마 변경
    ThemeChanged(Theme),
    /// 모니터 상태 변경
    MonitorStateChanged(MonitorState),
}

impl BroadcastEvent {
    /// 이벤트 종류 이름 (로깅용)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SettingsChanged(_) => "settings_changed",
            Self::ThemeChanged(_) => "theme_changed",
            Self::MonitorStateChanged(_) => "monitor_state_changed",
        }
    }
}
