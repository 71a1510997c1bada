//! 작업 필터 평가.
//!
//! 여섯 개의 독립 조건(유형, 소요 시간, 시간대, 요일, 최소 보상, 사용자 규칙)을
//! 모두 만족해야 작업을 수락한다. 필터가 모두 기본값이면 항상 수락.
//! 알 수 없는 필드/연산자와 평가 오류는 통과(fail-open) 처리한다.

use chrono::{Datelike, NaiveDateTime, Timelike};
use hubwatch_core::config::{parse_hhmm, CustomRule, FilterConfig, TimeRange};
use hubwatch_core::models::task::TaskInfo;
use serde::Serialize;
use tracing::debug;

/// 작업을 거절한 조건
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCheck {
    TaskType,
    Duration,
    TimeOfDay,
    DayOfWeek,
    Reward,
    /// 사용자 규칙 (목록 내 인덱스)
    CustomRule(usize),
}

/// 필터 평가 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterDecision {
    /// 거절한 조건 목록 (비어 있으면 수락)
    pub rejected_by: Vec<FilterCheck>,
}

impl FilterDecision {
    pub fn accepted(&self) -> bool {
        self.rejected_by.is_empty()
    }
}

/// 작업 수락 여부
pub fn accepts(task: &TaskInfo, filters: &FilterConfig, now: NaiveDateTime) -> bool {
    evaluate(task, filters, now).accepted()
}

/// 모든 조건을 평가하고 거절 사유를 모은다
pub fn evaluate(task: &TaskInfo, filters: &FilterConfig, now: NaiveDateTime) -> FilterDecision {
    let mut decision = FilterDecision::default();
    if filters.is_disabled() {
        return decision;
    }

    if !task_type_allowed(task, filters) {
        decision.rejected_by.push(FilterCheck::TaskType);
    }
    if !duration_allowed(task, filters) {
        decision.rejected_by.push(FilterCheck::Duration);
    }
    if !time_of_day_allowed(&filters.time_range, now) {
        decision.rejected_by.push(FilterCheck::TimeOfDay);
    }
    if !day_allowed(filters, now) {
        decision.rejected_by.push(FilterCheck::DayOfWeek);
    }
    if filters.min_reward > 0.0 && task.reward_dollars < filters.min_reward {
        decision.rejected_by.push(FilterCheck::Reward);
    }
    for (index, rule) in filters.custom_rules.iter().enumerate() {
        if !rule_allows(rule, task) {
            decision.rejected_by.push(FilterCheck::CustomRule(index));
        }
    }

    decision
}

fn task_type_allowed(task: &TaskInfo, filters: &FilterConfig) -> bool {
    filters.task_types.is_empty()
        || filters
            .task_types
            .iter()
            .any(|t| t.trim().eq_ignore_ascii_case(&task.task_type))
}

fn duration_allowed(task: &TaskInfo, filters: &FilterConfig) -> bool {
    let min = f64::from(filters.min_duration_minutes);
    let max = f64::from(filters.max_duration_minutes);
    (min == 0.0 || task.duration_minutes >= min) && (max == 0.0 || task.duration_minutes <= max)
}

fn time_of_day_allowed(range: &TimeRange, now: NaiveDateTime) -> bool {
    if !range.enabled {
        return true;
    }
    let (Some(start), Some(end)) = (parse_hhmm(&range.start), parse_hhmm(&range.end)) else {
        debug!(start = %range.start, end = %range.end, "시간대 파싱 실패, 통과 처리");
        return true;
    };
    let minutes = now.hour() * 60 + now.minute();
    if start <= end {
        (start..=end).contains(&minutes)
    } else {
        // 자정을 넘는 구간 (예: 22:00 ~ 02:00)
        minutes >= start || minutes <= end
    }
}

fn day_allowed(filters: &FilterConfig, now: NaiveDateTime) -> bool {
    if filters.covers_all_days() {
        return true;
    }
    // ISO 요일: 월=1 … 일=7
    let weekday = now.weekday().number_from_monday() as u8;
    filters.days_of_week.contains(&weekday)
}

// ============================================================
// 사용자 정의 규칙
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleField {
    Type,
    Duration,
    Reward,
}

impl RuleField {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "type" | "task_type" => Some(Self::Type),
            "duration" | "duration_minutes" => Some(Self::Duration),
            "reward" | "reward_dollars" => Some(Self::Reward),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    GreaterThanEqual,
    LessThanEqual,
    StartsWith,
    EndsWith,
}

impl RuleOperator {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "equals" => Some(Self::Equals),
            "not_equals" => Some(Self::NotEquals),
            "contains" => Some(Self::Contains),
            "greater_than" => Some(Self::GreaterThan),
            "less_than" => Some(Self::LessThan),
            "greater_than_equal" => Some(Self::GreaterThanEqual),
            "less_than_equal" => Some(Self::LessThanEqual),
            "starts_with" => Some(Self::StartsWith),
            "ends_with" => Some(Self::EndsWith),
            _ => None,
        }
    }
}

/// 규칙 평가 오류 (통과 처리됨)
#[derive(Debug)]
struct RuleError(String);

/// 규칙 하나 평가. 알 수 없는 필드/연산자, 평가 오류는 통과.
fn rule_allows(rule: &CustomRule, task: &TaskInfo) -> bool {
    let (Some(field), Some(operator)) = (RuleField::parse(&rule.field), RuleOperator::parse(&rule.operator))
    else {
        debug!(field = %rule.field, operator = %rule.operator, "알 수 없는 규칙, 통과 처리");
        return true;
    };

    match evaluate_rule(field, operator, &rule.value, task) {
        Ok(result) => result,
        Err(RuleError(reason)) => {
            debug!(%reason, "규칙 평가 실패, 통과 처리");
            true
        }
    }
}

fn evaluate_rule(
    field: RuleField,
    operator: RuleOperator,
    value: &str,
    task: &TaskInfo,
) -> Result<bool, RuleError> {
    let actual_number = match field {
        RuleField::Type => None,
        RuleField::Duration => Some(task.duration_minutes),
        RuleField::Reward => Some(task.reward_dollars),
    };
    let actual_text = match actual_number {
        Some(n) => format_number(n),
        None => task.task_type.to_lowercase(),
    };
    let expected_text = value.trim().to_lowercase();

    let numeric = || -> Result<(f64, f64), RuleError> {
        let actual = actual_number
            .ok_or_else(|| RuleError(format!("문자열 필드에 숫자 비교: {value}")))?;
        let expected = value
            .trim()
            .parse::<f64>()
            .map_err(|e| RuleError(format!("숫자 파싱 실패: {value}: {e}")))?;
        Ok((actual, expected))
    };

    let result = match operator {
        RuleOperator::Equals => match actual_number {
            Some(_) => {
                let (a, e) = numeric()?;
                (a - e).abs() < f64::EPSILON
            }
            None => actual_text == expected_text,
        },
        RuleOperator::NotEquals => match actual_number {
            Some(_) => {
                let (a, e) = numeric()?;
                (a - e).abs() >= f64::EPSILON
            }
            None => actual_text != expected_text,
        },
        RuleOperator::Contains => actual_text.contains(&expected_text),
        RuleOperator::StartsWith => actual_text.starts_with(&expected_text),
        RuleOperator::EndsWith => actual_text.ends_with(&expected_text),
        RuleOperator::GreaterThan => {
            let (a, e) = numeric()?;
            a > e
        }
        RuleOperator::LessThan => {
            let (a, e) = numeric()?;
            a < e
        }
        RuleOperator::GreaterThanEqual => {
            let (a, e) = numeric()?;
            a >= e
        }
        RuleOperator::LessThanEqual => {
            let (a, e) = numeric()?;
            a <= e
        }
    };
    Ok(result)
}

/// 숫자를 비교용 문자열로 (불필요한 소수점 제거)
fn format_number(value: f64) -> String {
    let text = format!("{value}");
    text.strip_suffix(".0").map(str::to_string).unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hubwatch_core::models::task::Complexity;

    /// 2026-10-14 (수요일) 12:00
    fn wednesday_noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 14)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn search_task() -> TaskInfo {
        TaskInfo {
            task_type: "search".to_string(),
            duration_minutes: 5.0,
            reward_dollars: 0.03,
            complexity: Complexity::Low,
        }
    }

    fn rule(field: &str, operator: &str, value: &str) -> CustomRule {
        CustomRule {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn default_filters_accept_everything() {
        let filters = FilterConfig::default();
        let mut task = search_task();
        assert!(accepts(&task, &filters, wednesday_noon()));

        task.reward_dollars = 0.0;
        task.duration_minutes = 500.0;
        task.task_type = "anything".to_string();
        assert!(accepts(&task, &filters, wednesday_noon()));
    }

    #[test]
    fn min_reward_rejects_cheap_task() {
        let filters = FilterConfig {
            min_reward: 0.05,
            ..FilterConfig::default()
        };
        let decision = evaluate(&search_task(), &filters, wednesday_noon());
        assert!(!decision.accepted());
        assert_eq!(decision.rejected_by, vec![FilterCheck::Reward]);
        assert!(!accepts(&search_task(), &filters, wednesday_noon()));
    }

    #[test]
    fn task_type_membership_is_case_insensitive() {
        let mut filters = FilterConfig::default();
        filters.task_types.insert("Search".to_string());
        assert!(accepts(&search_task(), &filters, wednesday_noon()));

        filters.task_types.clear();
        filters.task_types.insert("video".to_string());
        assert!(!accepts(&search_task(), &filters, wednesday_noon()));
    }

    #[test]
    fn duration_range_bounds_are_inclusive() {
        let filters = FilterConfig {
            min_duration_minutes: 5,
            max_duration_minutes: 5,
            ..FilterConfig::default()
        };
        assert!(accepts(&search_task(), &filters, wednesday_noon()));

        let filters = FilterConfig {
            min_duration_minutes: 6,
            ..FilterConfig::default()
        };
        assert!(!accepts(&search_task(), &filters, wednesday_noon()));
    }

    #[test]
    fn time_window_inclusive_and_wrapping() {
        let mut filters = FilterConfig::default();
        filters.time_range = TimeRange {
            enabled: true,
            start: "12:00".to_string(),
            end: "13:00".to_string(),
        };
        assert!(accepts(&search_task(), &filters, wednesday_noon()));

        filters.time_range.start = "12:01".to_string();
        assert!(!accepts(&search_task(), &filters, wednesday_noon()));

        // 자정을 넘는 구간
        filters.time_range.start = "22:00".to_string();
        filters.time_range.end = "02:00".to_string();
        assert!(!accepts(&search_task(), &filters, wednesday_noon()));
        let late = wednesday_noon().date().and_hms_opt(23, 30, 0).unwrap();
        assert!(accepts(&search_task(), &filters, late));
    }

    #[test]
    fn unparseable_time_window_fails_open() {
        let mut filters = FilterConfig::default();
        filters.time_range = TimeRange {
            enabled: true,
            start: "later".to_string(),
            end: "13:00".to_string(),
        };
        assert!(accepts(&search_task(), &filters, wednesday_noon()));
    }

    #[test]
    fn weekday_uses_iso_numbering() {
        let mut filters = FilterConfig::default();
        filters.days_of_week = [3].into_iter().collect(); // 수요일
        assert!(accepts(&search_task(), &filters, wednesday_noon()));

        filters.days_of_week = [7].into_iter().collect(); // 일요일
        assert!(!accepts(&search_task(), &filters, wednesday_noon()));
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert!(accepts(&search_task(), &filters, sunday));
    }

    #[test]
    fn custom_rules_all_must_hold() {
        let mut filters = FilterConfig::default();
        filters.custom_rules = vec![
            rule("type", "starts_with", "sea"),
            rule("reward", "greater_than_equal", "0.03"),
            rule("duration", "less_than", "10"),
        ];
        assert!(accepts(&search_task(), &filters, wednesday_noon()));

        filters.custom_rules.push(rule("type", "not_equals", "search"));
        let decision = evaluate(&search_task(), &filters, wednesday_noon());
        assert_eq!(decision.rejected_by, vec![FilterCheck::CustomRule(3)]);
    }

    #[test]
    fn custom_rule_operators() {
        let task = search_task();
        let cases = [
            (rule("type", "equals", "SEARCH"), true),
            (rule("type", "contains", "arc"), true),
            (rule("type", "ends_with", "ch"), true),
            (rule("duration", "equals", "5"), true),
            (rule("duration", "greater_than", "5"), false),
            (rule("reward", "less_than_equal", "0.03"), true),
            (rule("reward", "not_equals", "0.03"), false),
            (rule("duration", "contains", "5"), true),
        ];
        for (rule, expected) in cases {
            assert_eq!(rule_allows(&rule, &task), expected, "{rule:?}");
        }
    }

    #[test]
    fn unknown_or_broken_rules_fail_open() {
        let task = search_task();
        assert!(rule_allows(&rule("color", "equals", "red"), &task));
        assert!(rule_allows(&rule("type", "matches", ".*"), &task));
        assert!(rule_allows(&rule("reward", "greater_than", "lots"), &task));
        assert!(rule_allows(&rule("type", "greater_than", "10"), &task));
    }
}
