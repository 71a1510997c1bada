//! HTML → `PageSnapshot` 변환.
//!
//! 본문 텍스트(스크립트/스타일 제외)와 링크/버튼 컨트롤을 뽑는다.
//! 컨트롤의 상대 주소는 문서 URL 기준 절대 주소로 바꾼다.

use hubwatch_core::models::page::{PageControl, PageSnapshot};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// HTML 문서 파싱
pub fn parse_snapshot(page_url: &str, html: &str) -> PageSnapshot {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let mut snapshot = PageSnapshot::new(page_url, body_text(&document));
    snapshot.controls = collect_controls(&document, base.as_ref());
    snapshot
}

fn body_text(document: &Html) -> String {
    let mut parts = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
            .is_some_and(|name| matches!(name.as_str(), "script" | "style" | "noscript" | "template"));
        if hidden {
            continue;
        }
        let normalized = normalize_ws(text);
        if !normalized.is_empty() {
            parts.push(normalized);
        }
    }
    parts.join("\n")
}

fn collect_controls(document: &Html, base: Option<&Url>) -> Vec<PageControl> {
    let mut controls = Vec::new();

    if let Ok(links) = Selector::parse("a[href]") {
        for el in document.select(&links) {
            let Some(href) = el.value().attr("href") else {
                continue;
            };
            if href.starts_with("javascript:") || href.starts_with('#') {
                continue;
            }
            let label = element_label(&el);
            controls.push(PageControl::link(label, resolve(base, href)));
        }
    }

    if let Ok(buttons) =
        Selector::parse("button, input[type=submit], input[type=button]")
    {
        for el in document.select(&buttons) {
            let label = match el.value().name() {
                "input" => el.value().attr("value").unwrap_or_default().trim().to_string(),
                _ => element_label(&el),
            };
            let mut control = PageControl::button(label);
            if let Some(action) = enclosing_form_action(&el, base) {
                control = control.with_form_action(action);
            }
            controls.push(control);
        }
    }

    controls
}

/// 표시 텍스트, 없으면 aria-label/title
fn element_label(el: &ElementRef<'_>) -> String {
    let text = normalize_ws(&el.text().collect::<Vec<_>>().join(" "));
    if !text.is_empty() {
        return text;
    }
    ["aria-label", "title"]
        .iter()
        .find_map(|attr| el.value().attr(attr))
        .map(normalize_ws)
        .unwrap_or_default()
}

/// 버튼을 감싼 폼의 action (비어 있으면 문서 URL)
fn enclosing_form_action(el: &ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    let form = el
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "form")?;
    match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => Some(resolve(base, action)),
        _ => base.map(Url::to_string),
    }
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    match base.and_then(|b| b.join(href).ok()) {
        Some(url) => url.to_string(),
        None => href.to_string(),
    }
}

fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
