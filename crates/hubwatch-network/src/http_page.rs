//! HTTP 페이지 어댑터.
//!
//! `PageInspector` 포트 구현. 실제 브라우저 탭 대신 세션 쿠키를 가진 HTTP 클라이언트로
//! 페이지를 읽고, 마지막으로 받은 문서를 "현재 탭"으로 캐시한다.
//!
//! - `navigate` — GET 후 캐시 교체
//! - `snapshot` — 캐시 반환 (처음이면 시작 URL을 먼저 읽음)
//! - `invoke` — 링크는 이동, 폼 버튼은 POST 제출
//! - `dispatch_click` — HTTP에는 합성 이벤트가 없으므로 항상 `Unsupported`

use async_trait::async_trait;
use hubwatch_core::config::SiteConfig;
use hubwatch_core::error::CoreError;
use hubwatch_core::models::page::{ControlKind, PageControl, PageSnapshot};
use hubwatch_core::ports::page::PageInspector;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use tracing::{debug, warn};

use crate::snapshot::parse_snapshot;

const USER_AGENT: &str = concat!("hubwatch/", env!("CARGO_PKG_VERSION"));

/// HTTP 기반 페이지 어댑터
#[derive(Debug)]
pub struct HttpPage {
    client: reqwest::Client,
    start_url: String,
    current: RwLock<Option<PageSnapshot>>,
}

impl HttpPage {
    /// 새 어댑터 생성. `start_url`은 첫 `snapshot` 때 읽는다.
    pub fn new(site: &SiteConfig, start_url: &str) -> Result<Self, CoreError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = site.session_cookie.as_deref().filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| CoreError::validation("site.session_cookie", format!("{e}")))?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .timeout(site.request_timeout())
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            start_url: start_url.to_string(),
            current: RwLock::new(None),
        })
    }

    /// 현재 캐시된 문서 URL
    pub fn current_url(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.url.clone())
    }

    /// 응답을 스냅샷으로 변환
    ///
    /// 실패 상태 코드는 본문 앞에 `Error <code> <reason>`을 붙여 분류기가 볼 수 있게 한다.
    async fn read_response(resp: reqwest::Response) -> Result<PageSnapshot, CoreError> {
        let status = resp.status();
        let final_url = resp.url().to_string();
        let body = resp
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("응답 본문 읽기 실패: {e}")))?;

        let mut snapshot = parse_snapshot(&final_url, &body);
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %final_url, "실패 응답");
            let reason = status.canonical_reason().unwrap_or_default();
            snapshot.text = format!("Error {} {reason}\n{}", status.as_u16(), snapshot.text);
        }
        Ok(snapshot)
    }

    fn replace_current(&self, snapshot: PageSnapshot) {
        debug!(url = %snapshot.url, controls = snapshot.controls.len(), "현재 문서 갱신");
        *self.current.write() = Some(snapshot);
    }

    async fn submit_form(&self, action: &str) -> Result<(), CoreError> {
        let empty: [(&str, &str); 0] = [];
        let resp = self
            .client
            .post(action)
            .form(&empty)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("폼 제출 실패: {e}")))?;
        let snapshot = Self::read_response(resp).await?;
        self.replace_current(snapshot);
        Ok(())
    }
}

#[async_trait]
impl PageInspector for HttpPage {
    async fn snapshot(&self) -> Result<PageSnapshot, CoreError> {
        let cached = self.current.read().clone();
        if let Some(snapshot) = cached {
            return Ok(snapshot);
        }
        let start = self.start_url.clone();
        self.navigate(&start).await?;
        self.current
            .read()
            .clone()
            .ok_or_else(|| CoreError::Internal("문서 캐시가 비어 있음".to_string()))
    }

    async fn invoke(&self, control: &PageControl) -> Result<(), CoreError> {
        match control.kind {
            ControlKind::Link => {
                let href = control
                    .href
                    .as_deref()
                    .ok_or_else(|| CoreError::ElementNotFound(format!("링크 대상 없음: {}", control.label)))?;
                self.navigate(href).await
            }
            ControlKind::Button => match control.form_action.as_deref() {
                Some(action) => self.submit_form(action).await,
                None => Err(CoreError::Unsupported(format!(
                    "폼 밖의 버튼은 HTTP로 호출할 수 없음: {}",
                    control.label
                ))),
            },
        }
    }

    async fn dispatch_click(&self, control: &PageControl) -> Result<(), CoreError> {
        Err(CoreError::Unsupported(format!(
            "HTTP 어댑터는 합성 클릭을 지원하지 않음: {}",
            control.label
        )))
    }

    async fn navigate(&self, url: &str) -> Result<(), CoreError> {
        debug!(url, "페이지 이동");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("페이지 요청 실패 ({url}): {e}")))?;
        let snapshot = Self::read_response(resp).await?;
        self.replace_current(snapshot);
        Ok(())
    }
}
