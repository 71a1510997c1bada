//! 페이지 상태 분류기.
//!
//! URL과 본문 텍스트/컨트롤만 보고 `PageState`를 결정하는 순수 함수.
//! 규칙은 우선순위 순으로 평가되며 첫 번째로 일치한 규칙이 이긴다.

use hubwatch_core::config::SiteConfig;
use hubwatch_core::models::page::{ControlKind, PageControl, PageSnapshot, PageState};
use url::Url;

/// 페이지 분류 인터페이스 (테스트에서 교체 가능)
pub trait PageClassifier: Send + Sync {
    /// 스냅샷 → 페이지 상태
    fn classify(&self, snapshot: &PageSnapshot) -> PageState;

    /// 작업 획득 컨트롤 탐색
    fn acquire_control<'a>(&self, snapshot: &'a PageSnapshot) -> Option<&'a PageControl>;

    /// 모니터링 기준 페이지인지
    fn is_main_url(&self, url: &str) -> bool;

    /// 사이트 규칙 교체 (설정 변경 시)
    fn update_site(&mut self, site: &SiteConfig);
}

/// 사이트 규칙 기반 분류기
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    site: SiteConfig,
}

impl RuleClassifier {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }

    /// 작업 상세 페이지 경로인지
    fn is_task_show(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => parsed.path().contains(&self.site.task_show_path),
            Err(_) => url.contains(&self.site.task_show_path),
        }
    }

    /// 작업 ID 쿼리 파라미터가 있는지
    fn has_task_id(&self, url: &str) -> bool {
        Url::parse(url)
            .map(|parsed| {
                parsed
                    .query_pairs()
                    .any(|(k, v)| k == self.site.task_id_param.as_str() && !v.is_empty())
            })
            .unwrap_or(false)
    }

    /// 획득 토큰이 붙은 링크인지
    fn is_acquire_link(&self, control: &PageControl) -> bool {
        let Some(href) = control.href.as_deref() else {
            return false;
        };
        match Url::parse(href) {
            Ok(parsed) => parsed
                .query_pairs()
                .any(|(k, _)| k == self.site.acquire_token_param.as_str()),
            Err(_) => href.contains(&format!("{}=", self.site.acquire_token_param)),
        }
    }
}

impl PageClassifier for RuleClassifier {
    fn classify(&self, snapshot: &PageSnapshot) -> PageState {
        let url = snapshot.url.as_str();
        let task_show = self.is_task_show(url);

        // 1. 제출 완료/접근 거부된 작업 페이지
        if task_show && snapshot.text_contains_any(&self.site.forbidden_markers) {
            return PageState::TaskShowForbidden;
        }

        // 2. 작업 목록 페이지
        if same_page(url, &self.site.task_index_url) {
            return PageState::TaskIndex;
        }

        // 3. 진행 중인 작업 페이지
        if task_show && self.has_task_id(url) {
            return PageState::TaskShowActive;
        }

        // 4. 미완료 작업 안내
        if snapshot.text_contains(&self.site.incomplete_tasks_marker)
            && snapshot.has_control_labeled(&self.site.continue_label)
        {
            return PageState::IncompleteTasksPending;
        }

        // 5. 작업 대기열 페이지
        if self.is_main_url(url) {
            let has_acquire = self.acquire_control(snapshot).is_some();
            if snapshot.text_contains_any(&self.site.no_tasks_markers) && !has_acquire {
                return PageState::MainPageIdle;
            }
            if has_acquire {
                return PageState::MainPageTaskAvailable;
            }
            return PageState::Unknown;
        }

        // 6. 그 외
        PageState::Unknown
    }

    fn acquire_control<'a>(&self, snapshot: &'a PageSnapshot) -> Option<&'a PageControl> {
        snapshot
            .controls
            .iter()
            .find(|c| c.kind == ControlKind::Link && self.is_acquire_link(c))
            .or_else(|| {
                snapshot
                    .controls
                    .iter()
                    .find(|c| c.label_contains("acquire") && c.label_contains("available"))
            })
    }

    fn is_main_url(&self, url: &str) -> bool {
        same_page(url, &self.site.main_url)
    }

    fn update_site(&mut self, site: &SiteConfig) {
        self.site = site.clone();
    }
}

/// 두 URL이 같은 페이지인지 (쿼리, 프래그먼트, 끝 슬래시 무시)
fn same_page(a: &str, b: &str) -> bool {
    match (page_key(a), page_key(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.trim_end_matches('/') == b.trim_end_matches('/'),
    }
}

fn page_key(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?;
    let port = parsed.port().map(|p| format!(":{p}")).unwrap_or_default();
    Some(format!(
        "{}://{}{}{}",
        parsed.scheme(),
        host,
        port,
        parsed.path().trim_end_matches('/')
    ))
}
