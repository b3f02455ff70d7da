//! 패턴 규칙 -- 정규식 + 앞/뒤 컨텍스트 라인 수
//!
//! 설정의 `regex-patterns` 목록을 컴파일하여 순서가 있는 불변 규칙 세트를 만듭니다.
//!
//! # 설정 형식
//! ```yaml
//! regex-patterns:
//!   - regex: "\\[Server thread/ERROR\\]"
//!     above: 2
//!     below: 5
//!   - regex: "joined the game"
//! ```
//!
//! # 아키텍처
//! - [`PatternRuleSet`]: 순서가 있는 규칙 목록. 재설정 시 통째로 교체됩니다.
//! - [`loader`]: 설정 항목 컴파일, 잘못된 항목 건너뛰기, 기본 규칙 대체
//! - [`types`]: 규칙 데이터 구조 정의

pub mod loader;
pub mod types;

pub use loader::{DEFAULT_PATTERN, RuleLoader};
pub use types::{PATTERN_PREFIX_CHARS, PatternRule, RuleId, RuleSummary};

/// 컴파일된 패턴 규칙 세트
///
/// 규칙은 설정 순서를 유지하며, 각 규칙의 [`RuleId`]는 세트 내 위치와 같습니다.
#[derive(Debug, Clone)]
pub struct PatternRuleSet {
    rules: Vec<PatternRule>,
    default_fallback: bool,
}

impl PatternRuleSet {
    /// 컴파일된 규칙 목록으로 세트를 생성합니다.
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self {
            rules,
            default_fallback: false,
        }
    }

    /// 기본 규칙 하나로 구성된 대체 세트를 생성합니다.
    pub(crate) fn fallback(rule: PatternRule) -> Self {
        Self {
            rules: vec![rule],
            default_fallback: true,
        }
    }

    /// 규칙 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 규칙이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 설정된 규칙이 없어 기본 규칙이 설치되었는지 확인합니다.
    pub fn is_default_fallback(&self) -> bool {
        self.default_fallback
    }

    /// 규칙을 순서대로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter()
    }

    /// ID로 규칙을 조회합니다.
    pub fn get(&self, id: RuleId) -> Option<&PatternRule> {
        self.rules.get(id.0).filter(|rule| rule.id == id)
    }

    /// 상태 보고용 규칙 요약 목록을 반환합니다.
    pub fn summaries(&self) -> Vec<RuleSummary> {
        self.rules.iter().map(PatternRule::summary).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logcap_core::config::PatternConfig;

    #[test]
    fn get_by_id() {
        let set = RuleLoader::compile(&[
            PatternConfig::new("a", 0, 0),
            PatternConfig::new("b", 0, 3),
        ]);
        assert_eq!(set.get(RuleId(1)).unwrap().pattern(), "b");
        assert!(set.get(RuleId(2)).is_none());
    }

    #[test]
    fn summaries_preserve_definitions() {
        let set = RuleLoader::compile(&[PatternConfig::new("ERROR", 2, 4)]);
        let summaries = set.summaries();
        assert_eq!(
            summaries,
            vec![RuleSummary {
                id: RuleId(0),
                pattern: "ERROR".to_owned(),
                above: 2,
                below: 4,
            }]
        );
    }
}
