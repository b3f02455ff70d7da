//! tick 결과와 엔진 상태 보고

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::rule::RuleSummary;

/// `tick()` 한 번의 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// 소스 파일에서 읽은 라인 수
    pub lines_read: usize,
    /// 생성된 캡처 이벤트 수
    pub events: usize,
    /// 출력 파일에 기록된 라인 수
    pub flushed: usize,
    /// tick 종료 시점의 대기 라인 수
    pub queued: usize,
    /// 소스 읽기 실패 여부 (다음 tick에서 같은 위치부터 재시도)
    pub read_failed: bool,
    /// 플러시 실패 여부 (남은 라인은 큐에 유지)
    pub flush_failed: bool,
}

/// 엔진 상태 스냅샷
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// 설치된 규칙 정의
    pub rules: Vec<RuleSummary>,
    /// 설정된 규칙이 없어 기본 규칙이 설치되었는지
    pub default_rule: bool,
    /// 현재 출력 파일 이름
    pub output_file: String,
    /// 현재 출력 파일 크기 (마지막 flush 기준)
    pub output_size_bytes: u64,
    /// 로테이션 임계값
    pub max_file_size_bytes: u64,
    /// tailing 중인 소스 파일. 없으면 tailing 비활성화.
    pub source: Option<PathBuf>,
    /// 웹훅 알림 활성화 여부
    pub notifications_enabled: bool,
    /// 플러시 대기 라인 수
    pub queued_lines: usize,
    /// below 캡처가 진행 중인 규칙 수
    pub pending_captures: usize,
    /// 누적 tick 수
    pub ticks: u64,
    /// 누적 읽은 라인 수
    pub lines_read: u64,
    /// 누적 캡처 이벤트 수
    pub events_captured: u64,
    /// 누적 기록 라인 수
    pub lines_flushed: u64,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "logcap status:")?;
        writeln!(f, "Patterns: {}", self.rules.len())?;
        for (index, rule) in self.rules.iter().enumerate() {
            writeln!(
                f,
                "  {}. {} (above: {}, below: {})",
                index + 1,
                rule.pattern,
                rule.above,
                rule.below
            )?;
        }
        writeln!(f, "Current file: {}", self.output_file)?;
        writeln!(
            f,
            "File size: {}KB / {}MB",
            self.output_size_bytes / 1024,
            self.max_file_size_bytes / (1024 * 1024)
        )?;
        match &self.source {
            Some(path) => writeln!(f, "Log file: {}", path.display())?,
            None => writeln!(f, "Log file: Not found")?,
        }
        writeln!(
            f,
            "Webhook: {}",
            if self.notifications_enabled {
                "Enabled"
            } else {
                "Disabled"
            }
        )?;
        write!(
            f,
            "Queued lines: {} (ticks: {}, read: {}, captured: {}, written: {})",
            self.queued_lines, self.ticks, self.lines_read, self.events_captured, self.lines_flushed
        )
    }
}
