//! 컨텍스트 엔진 -- 라인 단위 매칭과 above/below 윈도우 상태 머신
//!
//! 소스 파일의 새 라인을 하나씩 받아 [`CapturedEvent`] 목록을 생성합니다.
//! 윈도우 상태(최근 라인 버퍼, below 대기 목록)는 tick 경계를 넘어 유지되므로
//! 매칭 직후 tick이 끝나도 다음 tick의 라인이 below 컨텍스트로 캡처됩니다.
//!
//! # 라인 처리 순서
//! 1. 최근 라인 버퍼에 추가
//! 2. 대기 중인 below 캡처마다 CONTEXT 이벤트 (규칙 ID 순)
//! 3. 규칙마다 매칭 시 above CONTEXT, MATCH, below 카운트다운 (재)설치
//!
//! 같은 라인에서 대기 목록의 CONTEXT는 새 매칭 이벤트보다 항상 먼저 나옵니다.

mod pending;

pub use pending::PendingCaptureSet;

use std::sync::Arc;

use logcap_core::metrics as m;

use crate::buffer::RecentLineBuffer;
use crate::event::CapturedEvent;
use crate::rule::PatternRuleSet;

/// 컨텍스트 캡처 엔진
#[derive(Debug, Clone)]
pub struct ContextEngine {
    rules: Arc<PatternRuleSet>,
    recent: RecentLineBuffer,
    pending: PendingCaptureSet,
}

impl ContextEngine {
    /// 규칙 세트로 엔진을 생성합니다.
    pub fn new(rules: Arc<PatternRuleSet>) -> Self {
        Self {
            rules,
            recent: RecentLineBuffer::default(),
            pending: PendingCaptureSet::new(),
        }
    }

    /// 라인 하나를 처리하고 생성된 이벤트를 순서대로 반환합니다.
    ///
    /// 소스 파일에 나타난 순서대로 호출해야 합니다.
    pub fn observe(&mut self, line: &str) -> Vec<CapturedEvent> {
        self.recent.push(line);
        let mut events = Vec::new();

        for rule_id in self.pending.advance() {
            if let Some(rule) = self.rules.get(rule_id) {
                events.push(CapturedEvent::context(rule, line));
            }
        }

        for rule in self.rules.iter() {
            if !rule.is_match(line) {
                continue;
            }
            if rule.above > 0 {
                events.extend(
                    self.recent
                        .before_latest(rule.above)
                        .map(|previous| CapturedEvent::context(rule, previous)),
                );
            }
            events.push(CapturedEvent::matched(rule, line));
            self.pending.install(rule.id, rule.below);
        }

        for event in &events {
            metrics::counter!(m::EVENTS_CAPTURED_TOTAL, m::LABEL_KIND => event.kind.label())
                .increment(1);
        }
        events
    }

    /// 규칙 세트를 교체합니다.
    ///
    /// 대기 중인 below 캡처는 이전 세트의 규칙 ID를 가리키므로 모두 제거됩니다.
    /// 최근 라인 버퍼는 유지됩니다.
    pub fn replace_rules(&mut self, rules: Arc<PatternRuleSet>) {
        if !self.pending.is_empty() {
            tracing::debug!(
                dropped = self.pending.len(),
                "discarding pending below-context captures on rule reload"
            );
        }
        self.pending.clear();
        self.rules = rules;
    }

    /// 현재 규칙 세트를 반환합니다.
    pub fn rules(&self) -> &Arc<PatternRuleSet> {
        &self.rules
    }

    /// below 대기 목록을 반환합니다.
    pub fn pending(&self) -> &PendingCaptureSet {
        &self.pending
    }

    /// 최근 라인 버퍼를 반환합니다.
    pub fn recent(&self) -> &RecentLineBuffer {
        &self.recent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind::{self, Context, Match};
    use crate::rule::{RuleId, RuleLoader};
    use logcap_core::config::PatternConfig;
    use proptest::prelude::*;

    fn engine(patterns: &[PatternConfig]) -> ContextEngine {
        ContextEngine::new(Arc::new(RuleLoader::compile(patterns)))
    }

    fn summarize(events: &[CapturedEvent]) -> Vec<(EventKind, &str)> {
        events.iter().map(|e| (e.kind, e.raw_line.as_str())).collect()
    }

    fn feed(engine: &mut ContextEngine, lines: &[&str]) -> Vec<CapturedEvent> {
        lines.iter().flat_map(|line| engine.observe(line)).collect()
    }

    #[test]
    fn non_matching_line_emits_nothing() {
        let mut engine = engine(&[PatternConfig::new("ERROR", 2, 2)]);
        assert!(engine.observe("all quiet").is_empty());
        assert_eq!(engine.recent().len(), 1);
    }

    #[test]
    fn above_and_below_across_two_ticks() {
        let mut engine = engine(&[PatternConfig::new("ERROR", 1, 1)]);

        let first = feed(&mut engine, &["a", "ERROR x"]);
        assert_eq!(summarize(&first), vec![(Context, "a"), (Match, "ERROR x")]);
        assert_eq!(engine.pending().remaining(RuleId(0)), Some(1));

        let second = feed(&mut engine, &["b"]);
        assert_eq!(summarize(&second), vec![(Context, "b")]);
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn formatted_lines_carry_pattern_prefix() {
        let mut engine = engine(&[PatternConfig::new("ERROR", 1, 0)]);
        let events = feed(&mut engine, &["before", "ERROR boom"]);
        let formatted: Vec<_> = events.iter().map(|e| e.formatted.as_str()).collect();
        assert_eq!(
            formatted,
            vec!["CONTEXT [ERROR]: before", "MATCH [ERROR]: ERROR boom"]
        );
    }

    #[test]
    fn above_returns_fewer_lines_at_start() {
        let mut engine = engine(&[PatternConfig::new("ERROR", 5, 0)]);
        let events = feed(&mut engine, &["one", "ERROR"]);
        assert_eq!(summarize(&events), vec![(Context, "one"), (Match, "ERROR")]);
    }

    #[test]
    fn below_continues_through_other_rule_matches() {
        let mut engine = engine(&[
            PatternConfig::new("ERROR", 0, 2),
            PatternConfig::new("WARN", 0, 0),
        ]);
        let events = feed(&mut engine, &["ERROR a", "WARN b", "c", "d"]);
        assert_eq!(
            events
                .iter()
                .map(|e| (e.kind, e.rule_id, e.raw_line.as_str()))
                .collect::<Vec<_>>(),
            vec![
                (Match, RuleId(0), "ERROR a"),
                (Context, RuleId(0), "WARN b"),
                (Match, RuleId(1), "WARN b"),
                (Context, RuleId(0), "c"),
            ]
        );
    }

    #[test]
    fn line_can_be_context_for_several_rules() {
        let mut engine = engine(&[
            PatternConfig::new("alpha", 0, 1),
            PatternConfig::new("beta", 0, 1),
        ]);
        feed(&mut engine, &["alpha beta"]);
        let events = engine.observe("next");
        assert_eq!(
            events.iter().map(|e| e.rule_id).collect::<Vec<_>>(),
            vec![RuleId(0), RuleId(1)]
        );
        assert!(events.iter().all(|e| e.kind == Context));
    }

    #[test]
    fn pending_context_precedes_new_match_on_same_line() {
        let mut engine = engine(&[PatternConfig::new("ERROR", 0, 1)]);
        feed(&mut engine, &["ERROR first"]);
        let events = engine.observe("ERROR second");
        assert_eq!(
            summarize(&events),
            vec![(Context, "ERROR second"), (Match, "ERROR second")]
        );
        assert_eq!(engine.pending().remaining(RuleId(0)), Some(1));
    }

    #[test]
    fn rematch_while_pending_overwrites_countdown() {
        let mut engine = engine(&[PatternConfig::new("ERROR", 0, 3)]);
        // 첫 매칭 후 두 줄 소비 -> 남은 수 1
        feed(&mut engine, &["ERROR one", "x", "y"]);
        assert_eq!(engine.pending().remaining(RuleId(0)), Some(1));

        // 재매칭은 윈도우를 추가하지 않고 카운트다운을 3으로 되돌림
        feed(&mut engine, &["ERROR two"]);
        assert_eq!(engine.pending().remaining(RuleId(0)), Some(3));
        assert_eq!(engine.pending().len(), 1);

        let tail = feed(&mut engine, &["p", "q", "r", "s"]);
        assert_eq!(
            summarize(&tail),
            vec![(Context, "p"), (Context, "q"), (Context, "r")]
        );
    }

    #[test]
    fn above_context_may_repeat_lines_already_emitted() {
        let mut engine = engine(&[PatternConfig::new("ERROR", 2, 0)]);
        let events = feed(&mut engine, &["ERROR a", "ERROR b"]);
        assert_eq!(
            summarize(&events),
            vec![(Match, "ERROR a"), (Context, "ERROR a"), (Match, "ERROR b")]
        );
    }

    #[test]
    fn replace_rules_clears_pending_keeps_recent() {
        let mut engine = engine(&[PatternConfig::new("ERROR", 0, 5)]);
        feed(&mut engine, &["ctx", "ERROR"]);
        assert!(!engine.pending().is_empty());

        engine.replace_rules(Arc::new(RuleLoader::compile(&[PatternConfig::new(
            "WARN", 2, 0,
        )])));
        assert!(engine.pending().is_empty());

        let events = engine.observe("WARN now");
        assert_eq!(
            summarize(&events),
            vec![(Context, "ctx"), (Context, "ERROR"), (Match, "WARN now")]
        );
    }

    #[test]
    fn default_rule_matches_bukkit_lines() {
        let mut engine = engine(&[]);
        assert!(engine.rules().is_default_fallback());
        let events = engine.observe("[Server] Bukkit loaded");
        assert_eq!(summarize(&events), vec![(Match, "[Server] Bukkit loaded")]);
    }

    fn line_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("ERROR boom".to_owned()),
            Just("WARN slow".to_owned()),
            "[a-z ]{0,12}",
        ]
    }

    proptest! {
        #[test]
        fn match_events_are_exactly_matching_line_rule_pairs(
            lines in proptest::collection::vec(line_strategy(), 0..60),
            above in 0usize..4,
            below in 0usize..4,
        ) {
            let mut engine = engine(&[
                PatternConfig::new("ERROR", above as i64, below as i64),
                PatternConfig::new("WARN", below as i64, above as i64),
            ]);
            let mut expected = Vec::new();
            let mut actual = Vec::new();
            for line in &lines {
                for (id, needle) in ["ERROR", "WARN"].iter().enumerate() {
                    if line.contains(needle) {
                        expected.push((RuleId(id), line.clone()));
                    }
                }
                for event in engine.observe(line) {
                    if event.kind == Match {
                        actual.push((event.rule_id, event.raw_line));
                    }
                }
            }
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn windows_follow_source_order(
            lines in proptest::collection::vec(line_strategy(), 1..60),
            above in 0usize..4,
            below in 0usize..4,
        ) {
            let mut engine = engine(&[PatternConfig::new("ERROR", above as i64, below as i64)]);
            for (index, line) in lines.iter().enumerate() {
                let events = engine.observe(line);

                if line.contains("ERROR") {
                    let match_pos = events.iter().position(|e| e.kind == Match).unwrap();
                    let window: Vec<&str> = events[..match_pos]
                        .iter()
                        .rev()
                        .take(above.min(index))
                        .map(|e| e.raw_line.as_str())
                        .collect::<Vec<_>>()
                        .into_iter()
                        .rev()
                        .collect();
                    let start = index - above.min(index);
                    let expected: Vec<&str> = lines[start..index].iter().map(String::as_str).collect();
                    prop_assert_eq!(window, expected);
                    prop_assert_eq!(match_pos + 1, events.len());
                }
            }
        }

        #[test]
        fn below_captures_exactly_next_k_lines(
            prefix in proptest::collection::vec("[a-z]{1,6}", 0..5),
            suffix in proptest::collection::vec("[a-z]{1,6}", 0..10),
            below in 0usize..6,
        ) {
            let mut engine = engine(&[PatternConfig::new("ERROR", 0, below as i64)]);
            for line in &prefix {
                prop_assert!(engine.observe(line).is_empty());
            }
            engine.observe("ERROR trigger");
            let captured: Vec<String> = suffix
                .iter()
                .flat_map(|line| engine.observe(line))
                .map(|e| e.raw_line)
                .collect();
            let expected: Vec<String> = suffix.iter().take(below).cloned().collect();
            prop_assert_eq!(captured, expected);
        }

        #[test]
        fn recent_buffer_never_exceeds_capacity(count in 0usize..400) {
            let mut engine = engine(&[PatternConfig::new("x", 0, 0)]);
            for i in 0..count {
                engine.observe(&format!("line {i}"));
            }
            prop_assert!(engine.recent().len() <= crate::buffer::MAX_RECENT);
        }
    }
}
