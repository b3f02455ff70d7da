//! 이벤트 큐 -- 영속화 대기 중인 출력 라인
//!
//! 생산자는 tick 내부의 캡처 경로, 소비자는 출력 파일 관리자입니다.
//! 핸들을 복제하여 여러 곳에서 공유할 수 있습니다.
//!
//! # 오버플로우 정책
//! 용량(`max-queue-lines`)을 넘으면 가장 오래된 라인을 버립니다.
//! 디스크 장애가 길어져도 메모리가 무한히 늘지 않습니다.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use logcap_core::metrics as m;

/// 출력 라인 대기 큐
#[derive(Debug, Clone)]
pub struct EventQueue {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Inner {
    fn drop_excess(&mut self, incoming: usize) -> usize {
        let excess = (self.lines.len() + incoming).saturating_sub(self.capacity);
        let excess = excess.min(self.lines.len());
        self.lines.drain(..excess);
        excess
    }
}

impl EventQueue {
    /// 지정한 용량의 큐를 생성합니다. 용량 0은 1로 올립니다.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                lines: VecDeque::new(),
                capacity: capacity.max(1),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // 잠금 구간에는 패닉 지점이 없으므로 poison 상태도 그대로 사용
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 라인을 큐 끝에 추가합니다. 가득 차 있으면 가장 오래된 라인을 버립니다.
    pub fn push(&self, line: impl Into<String>) {
        let mut inner = self.lock();
        if inner.drop_excess(1) > 0 {
            metrics::counter!(m::QUEUE_DROPPED_TOTAL).increment(1);
            tracing::warn!(
                capacity = inner.capacity,
                "event queue full, dropping oldest captured line"
            );
        }
        inner.lines.push_back(line.into());
        metrics::gauge!(m::QUEUE_SIZE).set(inner.lines.len() as f64);
    }

    /// 큐에 쌓인 라인의 복사본을 순서대로 반환합니다. 큐는 변경하지 않습니다.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().lines.iter().cloned().collect()
    }

    /// 앞에서부터 `count`개 라인을 제거합니다.
    pub fn remove_front(&self, count: usize) {
        let mut inner = self.lock();
        let count = count.min(inner.lines.len());
        inner.lines.drain(..count);
        metrics::gauge!(m::QUEUE_SIZE).set(inner.lines.len() as f64);
    }

    /// 대기 중인 라인 수
    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    /// 큐가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.lock().lines.is_empty()
    }

    /// 최대 용량
    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// 용량을 변경합니다. 줄어든 용량을 넘는 오래된 라인은 버립니다.
    pub fn set_capacity(&self, capacity: usize) {
        let mut inner = self.lock();
        inner.capacity = capacity.max(1);
        let dropped = inner.drop_excess(0);
        if dropped > 0 {
            metrics::counter!(m::QUEUE_DROPPED_TOTAL).increment(dropped as u64);
            metrics::gauge!(m::QUEUE_SIZE).set(inner.lines.len() as f64);
            tracing::warn!(
                dropped,
                capacity = inner.capacity,
                "event queue capacity reduced, dropping oldest captured lines"
            );
        }
    }
}
