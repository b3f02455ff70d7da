//! 캡처 이벤트 -- 컨텍스트 엔진이 생성하는 출력 단위
//!
//! [`CapturedEvent`]는 생성 후 불변이며, 이벤트 큐와 알림 싱크가 소비합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rule::{PatternRule, RuleId};

/// 이벤트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    /// 규칙에 매칭된 라인
    Match,
    /// 매칭 주변의 컨텍스트 라인
    Context,
}

impl EventKind {
    /// 출력 라인에 쓰이는 표기
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Match => "MATCH",
            Self::Context => "CONTEXT",
        }
    }

    /// 메트릭 레이블 값
    pub fn label(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Context => "context",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 캡처된 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedEvent {
    /// 이벤트 종류
    pub kind: EventKind,
    /// 이벤트를 만든 규칙
    pub rule_id: RuleId,
    /// 소스 파일의 원시 라인
    pub raw_line: String,
    /// `"<KIND> [<패턴 앞 20자>]: <원시 라인>"` 형식의 출력 라인
    pub formatted: String,
}

impl CapturedEvent {
    /// 규칙과 원시 라인으로 이벤트를 생성합니다.
    pub fn new(kind: EventKind, rule: &PatternRule, raw_line: &str) -> Self {
        Self {
            kind,
            rule_id: rule.id,
            raw_line: raw_line.to_owned(),
            formatted: format!("{} [{}]: {}", kind, rule.prefix(), raw_line),
        }
    }

    /// MATCH 이벤트를 생성합니다.
    pub fn matched(rule: &PatternRule, raw_line: &str) -> Self {
        Self::new(EventKind::Match, rule, raw_line)
    }

    /// CONTEXT 이벤트를 생성합니다.
    pub fn context(rule: &PatternRule, raw_line: &str) -> Self {
        Self::new(EventKind::Context, rule, raw_line)
    }
}
