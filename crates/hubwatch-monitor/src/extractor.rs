//! 작업 정보 추출.
//!
//! 페이지 텍스트에서 작업 유형, 소요 시간, 보상을 휴리스틱으로 추출한다.
//! 패턴을 찾지 못한 값은 작업 유형별 기본값으로 채운다 (실패가 전파되지 않음).

use hubwatch_core::models::page::{PageControl, PageSnapshot};
use hubwatch_core::models::task::{Complexity, TaskInfo};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static MINUTES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:minutes?|mins?)\b").expect("분 패턴")
});

static SECONDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:seconds?|secs?)\b").expect("초 패턴")
});

static REWARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*(\d+(?:\.\d+)?)").expect("보상 패턴"));

/// 키워드 → 작업 유형 (앞쪽이 우선)
const TYPE_KEYWORDS: &[(&str, &str)] = &[
    ("side by side", "side_by_side"),
    ("side-by-side", "side_by_side"),
    ("sxs", "side_by_side"),
    ("translation", "translation"),
    ("writing", "writing"),
    ("video", "video"),
    ("audio", "audio"),
    ("image", "image"),
    ("search", "search"),
];

/// 유형을 알 수 없을 때 사용하는 이름
pub const GENERAL_TASK_TYPE: &str = "general";

/// 작업 유형별 기본값
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskDefaults {
    pub duration_minutes: f64,
    pub reward_dollars: f64,
    pub complexity: Complexity,
}

/// 작업 유형별 기본값 조회
pub fn defaults_for(task_type: &str) -> TaskDefaults {
    let (duration_minutes, reward_dollars, complexity) = match task_type {
        "search" => (5.0, 0.03, Complexity::Low),
        "side_by_side" => (8.0, 0.06, Complexity::Medium),
        "video" => (10.0, 0.10, Complexity::Medium),
        "audio" => (6.0, 0.05, Complexity::Low),
        "image" => (3.0, 0.02, Complexity::Low),
        "translation" => (12.0, 0.12, Complexity::High),
        "writing" => (15.0, 0.15, Complexity::High),
        _ => (5.0, 0.04, Complexity::Medium),
    };
    TaskDefaults {
        duration_minutes,
        reward_dollars,
        complexity,
    }
}

/// 스냅샷(과 획득 컨트롤 라벨)에서 작업 정보 추출
pub fn extract_task_info(snapshot: &PageSnapshot, control: Option<&PageControl>) -> TaskInfo {
    let haystack = match control {
        Some(c) => format!("{}\n{}", c.label, snapshot.text),
        None => snapshot.text.clone(),
    };

    let task_type = detect_task_type(&haystack);
    let defaults = defaults_for(&task_type);

    let duration = find_duration_minutes(&haystack);
    let reward = find_reward(&haystack);
    if duration.is_none() || reward.is_none() {
        debug!(
            task_type = %task_type,
            duration_found = duration.is_some(),
            reward_found = reward.is_some(),
            "작업 정보 일부 추출 실패, 유형별 기본값 사용"
        );
    }

    TaskInfo {
        complexity: duration
            .map(Complexity::from_duration)
            .unwrap_or(defaults.complexity),
        duration_minutes: duration.unwrap_or(defaults.duration_minutes),
        reward_dollars: reward.unwrap_or(defaults.reward_dollars),
        task_type,
    }
}

fn detect_task_type(text: &str) -> String {
    let lower = text.to_lowercase();
    TYPE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, task_type)| task_type.to_string())
        .unwrap_or_else(|| GENERAL_TASK_TYPE.to_string())
}

fn find_duration_minutes(text: &str) -> Option<f64> {
    if let Some(value) = first_number(&MINUTES_RE, text) {
        return Some(value);
    }
    first_number(&SECONDS_RE, text).map(|secs| secs / 60.0)
}

fn find_reward(text: &str) -> Option<f64> {
    first_number(&REWARD_RE, text)
}

fn first_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: &str = "https://www.raterhub.com/evaluation/rater";

    #[test]
    fn extracts_all_fields_from_text() {
        let snapshot = PageSnapshot::new(
            MAIN,
            "Side by Side evaluation. Estimated time: 12 minutes. Pay: $0.18",
        );
        let task = extract_task_info(&snapshot, None);
        assert_eq!(task.task_type, "side_by_side");
        assert_eq!(task.duration_minutes, 12.0);
        assert_eq!(task.reward_dollars, 0.18);
        assert_eq!(task.complexity, Complexity::High);
    }

    #[test]
    fn seconds_are_converted_to_minutes() {
        let snapshot = PageSnapshot::new(MAIN, "Image task - AET 90 seconds");
        let task = extract_task_info(&snapshot, None);
        assert_eq!(task.task_type, "image");
        assert_eq!(task.duration_minutes, 1.5);
        assert_eq!(task.complexity, Complexity::Low);
    }

    #[test]
    fn missing_values_fall_back_to_type_defaults() {
        let snapshot = PageSnapshot::new(MAIN, "Search quality task available");
        let task = extract_task_info(&snapshot, None);
        assert_eq!(task.task_type, "search");
        assert_eq!(task.duration_minutes, 5.0);
        assert_eq!(task.reward_dollars, 0.03);
        assert_eq!(task.complexity, Complexity::Low);
    }

    #[test]
    fn unknown_type_uses_general_defaults() {
        let snapshot = PageSnapshot::new(MAIN, "");
        let task = extract_task_info(&snapshot, None);
        assert_eq!(task.task_type, GENERAL_TASK_TYPE);
        assert_eq!(task.duration_minutes, defaults_for(GENERAL_TASK_TYPE).duration_minutes);
    }

    #[test]
    fn control_label_contributes_to_detection() {
        let snapshot = PageSnapshot::new(MAIN, "Tasks ready");
        let control = PageControl::link("Acquire video task (7 min)", format!("{MAIN}/task/new"));
        let task = extract_task_info(&snapshot, Some(&control));
        assert_eq!(task.task_type, "video");
        assert_eq!(task.duration_minutes, 7.0);
    }
}
