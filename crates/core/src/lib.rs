//! logcap 공통 크레이트
//!
//! 모든 logcap 크레이트가 공유하는 설정 모델, 최상위 에러 타입,
//! 메트릭 이름 상수를 제공합니다.

pub mod config;
pub mod error;
pub mod metrics;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, LogcapError};

// 설정
pub use config::{CaptureConfig, GeneralConfig, LogcapConfig, MetricsConfig, PatternConfig};
