//! below 컨텍스트 대기 목록
//!
//! 규칙별로 아직 캡처해야 할 below 라인 수를 추적합니다.
//! 규칙당 항목은 최대 하나이며, 카운트가 0이 되면 제거됩니다.

use std::collections::BTreeMap;

use crate::rule::RuleId;

/// 규칙별 below 캡처 카운트다운
///
/// 규칙 ID 순서로 정렬된 맵을 사용하므로 한 라인이 여러 규칙의
/// CONTEXT로 출력될 때 순서가 결정적입니다.
#[derive(Debug, Clone, Default)]
pub struct PendingCaptureSet {
    remaining: BTreeMap<RuleId, usize>,
}

impl PendingCaptureSet {
    /// 빈 대기 목록을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 규칙의 카운트다운을 (재)설치합니다.
    ///
    /// 이미 대기 중인 규칙이 다시 매칭되면 남은 수를 `below`로 덮어씁니다
    /// (두 번째 윈도우를 만들거나 기존 윈도우를 연장하지 않음).
    /// `below`가 0이면 아무것도 하지 않습니다.
    pub fn install(&mut self, rule: RuleId, below: usize) {
        if below > 0 {
            self.remaining.insert(rule, below);
        }
    }

    /// 현재 라인을 CONTEXT로 받아야 하는 규칙 목록을 반환하고 카운트를 1씩 줄입니다.
    ///
    /// 0이 된 항목은 제거됩니다.
    pub fn advance(&mut self) -> Vec<RuleId> {
        let due: Vec<RuleId> = self.remaining.keys().copied().collect();
        self.remaining.retain(|_, left| {
            *left -= 1;
            *left > 0
        });
        due
    }

    /// 규칙의 남은 below 라인 수를 반환합니다.
    pub fn remaining(&self, rule: RuleId) -> Option<usize> {
        self.remaining.get(&rule).copied()
    }

    /// 대기 중인 규칙 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    /// 대기 중인 캡처가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// 모든 대기 항목을 제거합니다.
    pub fn clear(&mut self) {
        self.remaining.clear();
    }
}
