//! 규칙 로더 -- 설정의 패턴 목록을 컴파일합니다.
//!
//! 개별 규칙의 실패(잘못된 정규식, 음수 컨텍스트)는 경고 로그를 남기고 건너뜁니다.
//! 결과가 비어 있으면 기본 규칙 하나로 대체합니다.

use logcap_core::config::PatternConfig;

use super::PatternRuleSet;
use super::types::{PatternRule, RuleId};
use crate::error::CaptureError;

/// 규칙이 하나도 없을 때 설치되는 기본 패턴
pub const DEFAULT_PATTERN: &str = ".*Bukkit.*";

/// 최대 규칙 수
const MAX_RULES_COUNT: usize = 1_000;

/// 패턴 규칙 로더
pub struct RuleLoader;

impl RuleLoader {
    /// 설정 목록을 컴파일하여 규칙 세트를 생성합니다.
    ///
    /// - `regex`가 없거나 빈 항목은 조용히 건너뜁니다.
    /// - 컴파일 실패나 음수 컨텍스트는 경고 후 건너뜁니다.
    /// - 유효한 규칙이 하나도 없으면 [`DEFAULT_PATTERN`] 규칙을 설치합니다.
    ///
    /// 규칙 ID는 살아남은 규칙에 0부터 순서대로 부여됩니다.
    pub fn compile(patterns: &[PatternConfig]) -> PatternRuleSet {
        let mut rules = Vec::with_capacity(patterns.len());

        for (index, config) in patterns.iter().enumerate() {
            if rules.len() >= MAX_RULES_COUNT {
                tracing::warn!(
                    max = MAX_RULES_COUNT,
                    skipped = patterns.len() - index,
                    "too many regex patterns, ignoring the rest"
                );
                break;
            }

            match Self::compile_one(index, RuleId(rules.len()), config) {
                Ok(Some(rule)) => rules.push(rule),
                Ok(None) => {
                    tracing::debug!(index, "regex pattern without regex, skipping");
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "invalid regex pattern, skipping");
                }
            }
        }

        if rules.is_empty() {
            tracing::warn!(
                pattern = DEFAULT_PATTERN,
                "no usable regex patterns configured, using default pattern"
            );
            return PatternRuleSet::fallback(Self::default_rule());
        }

        tracing::info!(count = rules.len(), "compiled regex patterns");
        PatternRuleSet::new(rules)
    }

    /// 단일 설정 항목을 컴파일합니다.
    ///
    /// `regex`가 없거나 비어 있으면 `Ok(None)`을 반환합니다.
    pub fn compile_one(
        index: usize,
        id: RuleId,
        config: &PatternConfig,
    ) -> Result<Option<PatternRule>, CaptureError> {
        let Some(pattern) = config.regex.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(None);
        };

        let above = usize::try_from(config.above).map_err(|_| CaptureError::InvalidRule {
            index,
            reason: format!("above must be >= 0, got {}", config.above),
        })?;
        let below = usize::try_from(config.below).map_err(|_| CaptureError::InvalidRule {
            index,
            reason: format!("below must be >= 0, got {}", config.below),
        })?;

        PatternRule::new(id, pattern, above, below).map(Some)
    }

    fn default_rule() -> PatternRule {
        // DEFAULT_PATTERN은 상수이므로 컴파일 실패가 발생하지 않습니다.
        PatternRule::new(RuleId(0), DEFAULT_PATTERN, 0, 0)
            .unwrap_or_else(|e| unreachable!("default pattern must compile: {e}"))
    }
}
