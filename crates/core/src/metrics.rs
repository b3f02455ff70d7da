//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 캡처 엔진은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logcap_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logcap_core::metrics::LINES_READ_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 이벤트 종류 레이블 키 (match, context)
pub const LABEL_KIND: &str = "kind";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Tailer 메트릭 ─────────────────────────────────────────────────

/// 소스 파일에서 읽은 라인 수 (counter)
pub const LINES_READ_TOTAL: &str = "logcap_lines_read_total";

/// 소스 파일 읽기 실패 수 (counter)
pub const READ_ERRORS_TOTAL: &str = "logcap_read_errors_total";

/// truncation/교체 감지 횟수 (counter)
pub const SOURCE_RESETS_TOTAL: &str = "logcap_source_resets_total";

// ─── Context Engine 메트릭 ─────────────────────────────────────────

/// 캡처된 이벤트 수 (counter, label: kind)
pub const EVENTS_CAPTURED_TOTAL: &str = "logcap_events_captured_total";

// ─── Output 메트릭 ─────────────────────────────────────────────────

/// 출력 파일에 기록된 라인 수 (counter)
pub const LINES_WRITTEN_TOTAL: &str = "logcap_lines_written_total";

/// 출력 파일 로테이션 횟수 (counter)
pub const OUTPUT_ROTATIONS_TOTAL: &str = "logcap_output_rotations_total";

/// 플러시 실패 수 (counter)
pub const FLUSH_ERRORS_TOTAL: &str = "logcap_flush_errors_total";

/// 큐 오버플로우로 드롭된 라인 수 (counter)
pub const QUEUE_DROPPED_TOTAL: &str = "logcap_queue_dropped_total";

/// 플러시 대기 중인 라인 수 (gauge)
pub const QUEUE_SIZE: &str = "logcap_queue_size";

// ─── Notification 메트릭 ───────────────────────────────────────────

/// 웹훅 전송 시도 수 (counter, label: result)
pub const NOTIFICATIONS_TOTAL: &str = "logcap_notifications_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// Prometheus 레코더 설치 직후 한 번 호출합니다.
/// `metrics::describe_counter!()`, `describe_gauge!()`를
/// 사용하여 HELP 텍스트를 등록합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(LINES_READ_TOTAL, "Total lines read from the tailed source file");
    describe_counter!(READ_ERRORS_TOTAL, "Total failed reads of the tailed source file");
    describe_counter!(
        SOURCE_RESETS_TOTAL,
        "Total truncation or replacement resets of the tailed source file"
    );
    describe_counter!(
        EVENTS_CAPTURED_TOTAL,
        "Total captured events by kind (match, context)"
    );
    describe_counter!(LINES_WRITTEN_TOTAL, "Total lines persisted to output files");
    describe_counter!(OUTPUT_ROTATIONS_TOTAL, "Total output file rotations");
    describe_counter!(FLUSH_ERRORS_TOTAL, "Total failed output flushes");
    describe_counter!(
        QUEUE_DROPPED_TOTAL,
        "Total queued lines dropped because the event queue was full"
    );
    describe_gauge!(QUEUE_SIZE, "Lines waiting in the event queue");
    describe_counter!(
        NOTIFICATIONS_TOTAL,
        "Total webhook notification attempts by result"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_use_prefix() {
        let names = [
            LINES_READ_TOTAL,
            READ_ERRORS_TOTAL,
            SOURCE_RESETS_TOTAL,
            EVENTS_CAPTURED_TOTAL,
            LINES_WRITTEN_TOTAL,
            OUTPUT_ROTATIONS_TOTAL,
            FLUSH_ERRORS_TOTAL,
            QUEUE_DROPPED_TOTAL,
            QUEUE_SIZE,
            NOTIFICATIONS_TOTAL,
        ];
        for name in names {
            assert!(name.starts_with("logcap_"), "{name}");
        }
    }

    #[test]
    fn describe_all_without_recorder_does_not_panic() {
        describe_all();
    }
}
