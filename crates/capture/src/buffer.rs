//! 최근 라인 버퍼 -- above 컨텍스트 공급용 고정 용량 버퍼
//!
//! [`RecentLineBuffer`]는 소스 파일에서 읽은 마지막 N개의 원시 라인을
//! 순서대로 보관합니다. 매칭이 발생하면 현재 라인 직전의 라인들을
//! above 컨텍스트로 제공합니다.
//!
//! # 오버플로우 정책
//! 용량을 넘으면 가장 오래된 라인을 버립니다.

use std::collections::VecDeque;

/// 최근 라인 버퍼 기본 용량
pub const MAX_RECENT: usize = 100;

/// 최근 라인 버퍼
///
/// 컨텍스트 캡처는 이 버퍼를 읽기만 하며 변경하지 않습니다.
#[derive(Debug, Clone)]
pub struct RecentLineBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl RecentLineBuffer {
    /// 지정한 용량의 버퍼를 생성합니다.
    ///
    /// 용량 0은 1로 올려 현재 라인은 항상 보관되도록 합니다.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 라인을 추가합니다. 용량을 넘으면 가장 오래된 라인을 버립니다.
    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// 가장 최근 라인(현재 라인)을 제외한 마지막 `count`개 라인을 오래된 순으로 반환합니다.
    ///
    /// 버퍼에 그보다 적은 라인이 있으면 있는 만큼만 반환합니다.
    pub fn before_latest(&self, count: usize) -> impl Iterator<Item = &str> {
        let previous = self.lines.len().saturating_sub(1);
        let start = previous.saturating_sub(count);
        self.lines
            .range(start..previous)
            .map(String::as_str)
    }

    /// 현재 보관 중인 라인 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// 버퍼가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 버퍼 최대 용량을 반환합니다.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecentLineBuffer {
    fn default() -> Self {
        Self::new(MAX_RECENT)
    }
}
