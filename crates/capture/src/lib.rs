//! # logcap-capture
//!
//! 성장하는 텍스트 로그를 tailing하면서 정규식 규칙에 매칭되는 라인과
//! 그 주변 컨텍스트(앞 N줄, 뒤 M줄)를 캡처하여 파일로 영속화하고
//! 웹훅으로 전달하는 엔진입니다.
//!
//! # 모듈 구성
//!
//! - [`tailer`]: 소스 파일 증분 읽기, truncation/교체 감지
//! - [`buffer`]: above 컨텍스트용 최근 라인 버퍼
//! - [`rule`]: 패턴 규칙 컴파일 및 기본 규칙 대체
//! - [`context`]: 라인 단위 매칭과 above/below 윈도우 상태 머신
//! - [`event`]: 캡처 이벤트와 출력 라인 형식
//! - [`queue`]: 영속화 대기 큐
//! - [`output`]: 크기 기반 로테이션과 파일 기록
//! - [`notify`]: best-effort 웹훅 알림
//! - [`engine`]: 전체 흐름 오케스트레이션 (`configure`/`tick`/`shutdown`/`status`)
//! - [`config`]: 엔진 런타임 설정 (core 설정 변환)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! tick -> FileTailer -> ContextEngine -> EventQueue -> OutputFileManager -> captured_logs_N.txt
//!                            |
//!                            +-> NotificationSink (fire-and-forget HTTP POST)
//! ```

pub mod buffer;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod notify;
pub mod output;
pub mod queue;
pub mod rule;
pub mod status;
pub mod tailer;

// --- 주요 타입 re-export ---

// 엔진
pub use engine::CaptureEngine;
pub use status::{StatusReport, TickReport};

// 설정
pub use config::{CaptureSettings, CaptureSettingsBuilder};

// 에러
pub use error::CaptureError;

// 컨텍스트 캡처
pub use buffer::RecentLineBuffer;
pub use context::{ContextEngine, PendingCaptureSet};
pub use event::{CapturedEvent, EventKind};
pub use rule::{PatternRule, PatternRuleSet, RuleId, RuleLoader};

// 입출력
pub use notify::NotificationSink;
pub use output::OutputFileManager;
pub use queue::EventQueue;
pub use tailer::FileTailer;
