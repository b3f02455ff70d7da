//! 패턴 규칙 데이터 타입
//!
//! 설정의 `regex-patterns` 항목 하나가 컴파일된 결과를 정의합니다.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CaptureError;

/// 출력 라인의 규칙 표시에 사용하는 패턴 접두 길이 (문자 수)
pub const PATTERN_PREFIX_CHARS: usize = 20;

/// 규칙 식별자
///
/// 로드 시점에 규칙 세트 내 순서대로 부여되는 안정적인 정수 ID입니다.
/// 대기 중인 below 캡처는 규칙 객체가 아니라 이 ID로 추적합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleId(pub usize);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 컴파일된 패턴 규칙
///
/// 로드 이후 불변입니다. 재설정 시 규칙 세트 전체가 교체됩니다.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// 규칙 ID
    pub id: RuleId,
    /// 컴파일된 정규식
    regex: Regex,
    /// 매칭 라인 앞쪽 컨텍스트 라인 수
    pub above: usize,
    /// 매칭 라인 뒤쪽 컨텍스트 라인 수
    pub below: usize,
    /// 출력 라인에 표시할 패턴 접두
    prefix: String,
}

impl PatternRule {
    /// 정규식을 컴파일하여 규칙을 생성합니다.
    pub fn new(id: RuleId, pattern: &str, above: usize, below: usize) -> Result<Self, CaptureError> {
        let regex = Regex::new(pattern).map_err(|e| CaptureError::RuleCompile {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })?;
        let prefix = pattern.chars().take(PATTERN_PREFIX_CHARS).collect();
        Ok(Self {
            id,
            regex,
            above,
            below,
            prefix,
        })
    }

    /// 원본 패턴 문자열을 반환합니다.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// 패턴의 앞 20자를 반환합니다.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// 라인 어딘가에 패턴이 나타나는지 확인합니다 (전체 라인 앵커 아님).
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// 상태 보고용 요약을 생성합니다.
    pub fn summary(&self) -> RuleSummary {
        RuleSummary {
            id: self.id,
            pattern: self.pattern().to_owned(),
            above: self.above,
            below: self.below,
        }
    }
}

/// 상태 보고에 노출되는 규칙 정의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    /// 규칙 ID
    pub id: RuleId,
    /// 원본 패턴
    pub pattern: String,
    /// 앞쪽 컨텍스트 라인 수
    pub above: usize,
    /// 뒤쪽 컨텍스트 라인 수
    pub below: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_truncates_to_twenty_chars() {
        let rule = PatternRule::new(RuleId(0), r"\[Server thread/ERROR\]: .*", 0, 0).unwrap();
        assert_eq!(rule.prefix(), r"\[Server thread/ERRO");
        assert_eq!(rule.prefix().chars().count(), 20);
    }

    #[test]
    fn prefix_counts_characters_not_bytes() {
        let rule = PatternRule::new(RuleId(0), "에러가발생했습니다에러가발생했습니다에러가발생", 0, 0).unwrap();
        assert_eq!(rule.prefix().chars().count(), 20);
    }

    #[test]
    fn short_pattern_prefix_is_whole_pattern() {
        let rule = PatternRule::new(RuleId(0), "ERROR", 0, 0).unwrap();
        assert_eq!(rule.prefix(), "ERROR");
    }

    #[test]
    fn matches_substring_not_full_line() {
        let rule = PatternRule::new(RuleId(0), "ERROR", 0, 0).unwrap();
        assert!(rule.is_match("[12:00:00] [Server thread/ERROR]: boom"));
        assert!(!rule.is_match("all good"));
    }

    #[test]
    fn invalid_regex_is_rule_compile_error() {
        let err = PatternRule::new(RuleId(0), "[invalid", 0, 0).unwrap_err();
        assert!(matches!(err, CaptureError::RuleCompile { .. }));
    }
}
