//! 페이지 스냅샷 및 페이지 상태 모델.
//!
//! 스냅샷은 한 번의 폴링 시점에 읽은 URL, 본문 텍스트, 상호작용 컨트롤 목록이다.

use serde::{Deserialize, Serialize};

/// 컨트롤 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// `<a href>` 링크
    Link,
    /// `<button>` 또는 submit 입력
    Button,
}

/// 페이지의 상호작용 컨트롤
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageControl {
    pub kind: ControlKind,
    /// 표시 텍스트 (공백 정규화)
    pub label: String,
    /// 링크 대상 (절대 URL)
    #[serde(default)]
    pub href: Option<String>,
    /// 버튼이 속한 폼의 action (절대 URL)
    #[serde(default)]
    pub form_action: Option<String>,
}

impl PageControl {
    /// 링크 컨트롤 생성
    pub fn link(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            kind: ControlKind::Link,
            label: label.into(),
            href: Some(href.into()),
            form_action: None,
        }
    }

    /// 버튼 컨트롤 생성
    pub fn button(label: impl Into<String>) -> Self {
        Self {
            kind: ControlKind::Button,
            label: label.into(),
            href: None,
            form_action: None,
        }
    }

    /// 폼 action 지정
    pub fn with_form_action(mut self, action: impl Into<String>) -> Self {
        self.form_action = Some(action.into());
        self
    }

    /// 라벨 포함 여부 (대소문자 무시)
    pub fn label_contains(&self, needle: &str) -> bool {
        self.label.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// 한 시점의 페이지 스냅샷
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// 현재 문서 URL
    pub url: String,
    /// 본문 텍스트
    pub text: String,
    /// 상호작용 컨트롤
    #[serde(default)]
    pub controls: Vec<PageControl>,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            controls: Vec::new(),
        }
    }

    /// 컨트롤 추가
    pub fn with_control(mut self, control: PageControl) -> Self {
        self.controls.push(control);
        self
    }

    /// 본문에 문구가 있는지 확인 (대소문자 무시)
    pub fn text_contains(&self, marker: &str) -> bool {
        !marker.is_empty() && self.text.to_lowercase().contains(&marker.to_lowercase())
    }

    /// 문구 목록 중 하나라도 본문에 있는지 확인
    pub fn text_contains_any(&self, markers: &[String]) -> bool {
        markers.iter().any(|m| self.text_contains(m))
    }

    /// 라벨이 일치하는 컨트롤이 있는지 확인 (대소문자/앞뒤 공백 무시)
    pub fn has_control_labeled(&self, label: &str) -> bool {
        self.controls
            .iter()
            .any(|c| c.label.trim().eq_ignore_ascii_case(label.trim()))
    }
}

/// 폴링마다 새로 계산되는 페이지 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    /// 작업 대기열 페이지, 작업 없음
    MainPageIdle,
    /// 작업 대기열 페이지, 획득 컨트롤 있음
    MainPageTaskAvailable,
    /// 작업 진행 중 페이지
    TaskShowActive,
    /// 제출 완료/접근 거부된 작업 페이지
    TaskShowForbidden,
    /// 작업 목록 페이지
    TaskIndex,
    /// 미완료 작업 안내
    IncompleteTasksPending,
    /// 인식 불가
    Unknown,
}

impl PageState {
    /// 모니터링을 시작할 수 있는 상태인지
    pub fn is_monitorable(self) -> bool {
        matches!(self, Self::MainPageIdle | Self::MainPageTaskAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_markers_are_case_insensitive() {
        let snapshot = PageSnapshot::new("https://example.com", "No Tasks Are Currently Available.");
        assert!(snapshot.text_contains("no tasks are currently available"));
        assert!(!snapshot.text_contains(""));
        assert!(snapshot.text_contains_any(&["nothing".to_string(), "tasks are".to_string()]));
    }

    #[test]
    fn control_label_lookup() {
        let snapshot =
            PageSnapshot::new("https://example.com", "").with_control(PageControl::button(" Continue "));
        assert!(snapshot.has_control_labeled("continue"));
        assert!(!snapshot.has_control_labeled("Cancel"));
    }

    #[test]
    fn monitorable_states() {
        assert!(PageState::MainPageIdle.is_monitorable());
        assert!(PageState::MainPageTaskAvailable.is_monitorable());
        assert!(!PageState::TaskShowActive.is_monitorable());
        assert!(!PageState::Unknown.is_monitorable());
    }
}
