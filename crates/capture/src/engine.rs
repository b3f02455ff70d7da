//! 캡처 엔진 -- tailing, 컨텍스트 캡처, 출력, 알림을 하나의 컨텍스트로 묶습니다.
//!
//! [`CaptureEngine`]은 전역 상태 없이 한 인스턴스가 모든 런타임 상태를 소유합니다.
//! 호스트는 일정한 주기로 [`tick`](CaptureEngine::tick)을 직렬로 호출하고,
//! 설정이 바뀌면 [`configure`](CaptureEngine::configure),
//! 종료 시 [`shutdown`](CaptureEngine::shutdown)을 호출합니다.
//!
//! # tick 흐름
//! ```text
//! (소스 재탐색) -> FileTailer::read_new -> ContextEngine::observe
//!     -> OutputFileManager::enqueue + NotificationSink::notify -> OutputFileManager::flush
//! ```
//!
//! # 사용 예시
//! ```ignore
//! use logcap_capture::{CaptureEngine, CaptureSettings};
//!
//! let mut engine = CaptureEngine::new(CaptureSettings::default()).await?;
//! let report = engine.tick().await;
//! println!("{}", engine.status());
//! engine.shutdown().await?;
//! ```

use std::sync::Arc;

use crate::config::CaptureSettings;
use crate::context::ContextEngine;
use crate::error::CaptureError;
use crate::notify::NotificationSink;
use crate::output::OutputFileManager;
use crate::rule::RuleLoader;
use crate::status::{StatusReport, TickReport};
use crate::tailer::FileTailer;

/// 엔진 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    /// tick 처리 중
    Running,
    /// shutdown 완료
    Stopped,
}

/// 누적 카운터
#[derive(Debug, Default)]
struct Totals {
    ticks: u64,
    lines_read: u64,
    events_captured: u64,
    lines_flushed: u64,
}

/// 캡처 엔진
#[derive(Debug)]
pub struct CaptureEngine {
    settings: CaptureSettings,
    state: EngineState,
    context: ContextEngine,
    tailer: Option<FileTailer>,
    output: OutputFileManager,
    notifier: NotificationSink,
    totals: Totals,
}

impl CaptureEngine {
    /// 설정을 검증하고 엔진을 생성합니다.
    ///
    /// 소스 파일을 찾으면 파일 끝부터 tailing합니다 (기존 내용은 재생하지 않음).
    /// 찾지 못해도 에러가 아니며, `rediscover_source`가 켜져 있으면 매 tick 재탐색합니다.
    pub async fn new(settings: CaptureSettings) -> Result<Self, CaptureError> {
        settings.validate()?;

        let rules = Arc::new(RuleLoader::compile(&settings.patterns));
        let mut output = OutputFileManager::new(
            &settings.output_dir,
            settings.max_file_size_bytes,
            settings.max_queue_lines,
        );
        output.refresh_size().await;
        let notifier = NotificationSink::new(settings.webhook_url.clone(), settings.notify_timeout);

        let mut engine = Self {
            context: ContextEngine::new(rules),
            state: EngineState::Running,
            tailer: None,
            output,
            notifier,
            totals: Totals::default(),
            settings,
        };
        engine.attach_source().await;

        tracing::info!(
            rules = engine.context.rules().len(),
            output_dir = %engine.settings.output_dir.display(),
            max_file_size_bytes = engine.settings.max_file_size_bytes,
            notifications = engine.notifier.is_enabled(),
            "capture engine started"
        );
        Ok(engine)
    }

    /// 새 설정을 적용합니다.
    ///
    /// 규칙 세트, 임계값, 출력 디렉토리, 엔드포인트를 한 번에 교체합니다.
    /// 대기 중인 below 캡처는 버리고, 최근 라인 버퍼, 같은 소스의 오프셋,
    /// 출력 파일 번호는 유지합니다. 검증에 실패하면 기존 설정을 그대로 둡니다.
    pub async fn configure(&mut self, settings: CaptureSettings) -> Result<(), CaptureError> {
        settings.validate()?;

        let rules = Arc::new(RuleLoader::compile(&settings.patterns));
        self.context.replace_rules(rules);
        self.output.reconfigure(
            &settings.output_dir,
            settings.max_file_size_bytes,
            settings.max_queue_lines,
        );
        self.output.refresh_size().await;
        self.notifier
            .reconfigure(settings.webhook_url.clone(), settings.notify_timeout);
        self.settings = settings;
        self.attach_source().await;

        tracing::info!(
            rules = self.context.rules().len(),
            default_rule = self.context.rules().is_default_fallback(),
            "capture engine reconfigured"
        );
        Ok(())
    }

    /// 소스 후보를 탐색하여 tailer를 연결합니다.
    ///
    /// 이미 같은 파일을 tailing 중이면 오프셋을 유지합니다.
    async fn attach_source(&mut self) {
        let candidates = self.settings.source_candidates();
        let resolved = FileTailer::resolve_source(&candidates).await;

        let current = self.tailer.as_ref().map(|t| t.path().to_path_buf());

        match resolved {
            Some(path) if current.as_ref() == Some(&path) => {}
            Some(path) => match FileTailer::open(&path).await {
                Ok(tailer) => {
                    tracing::info!(path = %path.display(), "tailing source log");
                    self.tailer = Some(tailer);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to open source log");
                }
            },
            // 잠시 사라진 현재 소스는 계속 추적
            None if current.is_some_and(|c| candidates.contains(&c)) => {}
            None => {
                self.tailer = None;
                tracing::warn!(
                    candidates = ?candidates,
                    rediscover = self.settings.rediscover_source,
                    "source log not found, tailing disabled"
                );
            }
        }
    }

    /// 소스를 찾지 못한 상태에서 후보를 다시 탐색합니다.
    ///
    /// 늦게 발견된 파일은 처음부터 읽습니다.
    async fn rediscover_source(&mut self) {
        let candidates = self.settings.source_candidates();
        if let Some(path) = FileTailer::resolve_source(&candidates).await {
            tracing::info!(path = %path.display(), "source log found, tailing from start");
            self.tailer = Some(FileTailer::at_offset(path, 0));
        }
    }

    /// 한 주기를 처리합니다.
    ///
    /// 새 라인을 읽어 이벤트를 큐와 알림 싱크로 보내고, 읽은 라인이 없어도
    /// 항상 flush합니다. 어떤 실패도 에러로 반환하지 않으며 보고서에 표시합니다.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.state == EngineState::Stopped {
            tracing::debug!("tick after shutdown ignored");
            return report;
        }
        self.totals.ticks += 1;

        if self.tailer.is_none() && self.settings.rediscover_source {
            self.rediscover_source().await;
        }

        if let Some(tailer) = self.tailer.as_mut() {
            match tailer.read_new().await {
                Ok(lines) => {
                    report.lines_read = lines.len();
                    for line in &lines {
                        for event in self.context.observe(line) {
                            self.notifier.notify(&event.formatted);
                            self.output.enqueue(event.formatted);
                            report.events += 1;
                        }
                    }
                }
                Err(e) => {
                    report.read_failed = true;
                    tracing::warn!(error = %e, "failed to read source log, retrying next tick");
                }
            }
        }

        match self.output.flush().await {
            Ok(flushed) => report.flushed = flushed,
            Err(e) => {
                report.flush_failed = true;
                tracing::warn!(
                    error = %e,
                    queued = self.output.queue().len(),
                    "failed to write captured lines, retrying next tick"
                );
            }
        }
        report.queued = self.output.queue().len();

        self.totals.lines_read += report.lines_read as u64;
        self.totals.events_captured += report.events as u64;
        self.totals.lines_flushed += report.flushed as u64;
        report
    }

    /// 마지막 flush를 수행하고 소스 파일을 해제합니다.
    ///
    /// flush가 먼저 실행되며, 그 후 전송 중인 알림을 최대 `notify_timeout`만큼
    /// 기다립니다. flush 실패는 알림 대기 후 반환됩니다.
    pub async fn shutdown(&mut self) -> Result<usize, CaptureError> {
        if self.state == EngineState::Stopped {
            return Ok(0);
        }
        tracing::info!("stopping capture engine");

        let flushed = self.output.flush().await;
        if let Ok(count) = &flushed {
            self.totals.lines_flushed += *count as u64;
        }
        if let Err(e) = &flushed {
            tracing::warn!(
                error = %e,
                lost = self.output.queue().len(),
                "final flush failed"
            );
        }

        self.notifier.close(self.settings.notify_timeout).await;
        self.tailer = None;
        self.state = EngineState::Stopped;

        tracing::info!("capture engine stopped");
        flushed
    }

    /// 현재 상태를 보고합니다.
    pub fn status(&self) -> StatusReport {
        let rules = self.context.rules();
        StatusReport {
            rules: rules.summaries(),
            default_rule: rules.is_default_fallback(),
            output_file: self.output.current_file_name(),
            output_size_bytes: self.output.current_size(),
            max_file_size_bytes: self.output.threshold(),
            source: self.tailer.as_ref().map(|t| t.path().to_path_buf()),
            notifications_enabled: self.notifier.is_enabled(),
            queued_lines: self.output.queue().len(),
            pending_captures: self.context.pending().len(),
            ticks: self.totals.ticks,
            lines_read: self.totals.lines_read,
            events_captured: self.totals.events_captured,
            lines_flushed: self.totals.lines_flushed,
        }
    }

    /// 적용 중인 설정
    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// 현재 tailing 오프셋. 소스가 없으면 `None`.
    pub fn source_offset(&self) -> Option<u64> {
        self.tailer.as_ref().map(FileTailer::offset)
    }

    /// shutdown이 완료되었는지 확인합니다.
    pub fn is_stopped(&self) -> bool {
        self.state == EngineState::Stopped
    }
}
