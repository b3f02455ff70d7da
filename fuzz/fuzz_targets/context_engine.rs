#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logcap_capture::{ContextEngine, EventKind, RuleLoader};
use logcap_core::config::PatternConfig;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 규칙 목록 (최대 4개로 제한)
    rules: Vec<FuzzRule>,
    /// 순서대로 관찰할 라인
    lines: Vec<String>,
}

#[derive(Arbitrary, Debug)]
struct FuzzRule {
    regex: Option<String>,
    above: i8,
    below: i8,
}

fuzz_target!(|input: FuzzInput| {
    let patterns: Vec<PatternConfig> = input
        .rules
        .iter()
        .take(4)
        .map(|r| PatternConfig {
            regex: r.regex.clone(),
            above: i64::from(r.above),
            below: i64::from(r.below),
        })
        .collect();

    // 잘못된 정규식/음수 윈도우는 건너뛰고, 남은 규칙이 없으면 기본 규칙
    let rules = Arc::new(RuleLoader::compile(&patterns));
    assert!(!rules.is_empty());

    let mut engine = ContextEngine::new(Arc::clone(&rules));

    for line in input.lines.iter().take(256) {
        let line = line.replace(['\n', '\r'], "");
        let events = engine.observe(&line);

        // MATCH는 매칭된 규칙마다 정확히 한 번
        let matches = events.iter().filter(|e| e.kind == EventKind::Match).count();
        let expected = rules.iter().filter(|r| r.is_match(&line)).count();
        assert_eq!(matches, expected);

        for event in &events {
            assert!(rules.get(event.rule_id).is_some());
            assert!(event.formatted.ends_with(event.raw_line.as_str()));
        }
        assert!(engine.pending().len() <= rules.len());
    }
});
