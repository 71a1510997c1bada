//! 페이지 조회/조작 포트.
//!
//! 구현: `hubwatch-network` crate (reqwest + scraper)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::page::{PageControl, PageSnapshot};

/// 현재 문서에 대한 읽기 전용 조회 + 제한된 조작 인터페이스
///
/// 조작은 컨트롤 활성화(클릭 상당)와 전체 페이지 이동만 허용한다.
#[async_trait]
pub trait PageInspector: Send + Sync {
    /// 현재 문서의 URL/텍스트/컨트롤 스냅샷
    async fn snapshot(&self) -> Result<PageSnapshot, CoreError>;

    /// 컨트롤 직접 호출
    async fn invoke(&self, control: &PageControl) -> Result<(), CoreError>;

    /// 합성 클릭 이벤트 전달
    async fn dispatch_click(&self, control: &PageControl) -> Result<(), CoreError>;

    /// 전체 페이지 이동
    async fn navigate(&self, url: &str) -> Result<(), CoreError>;
}
