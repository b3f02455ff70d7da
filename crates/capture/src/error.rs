//! 캡처 엔진 에러 타입
//!
//! [`CaptureError`]는 캡처 엔진 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<CaptureError> for LogcapError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 캡처 경로(`tick`)의 에러는 프로세스에 치명적이지 않습니다.
//! 엔진은 에러를 로그로 남기고 다음 tick에서 재시도합니다.

use std::path::PathBuf;

use logcap_core::error::LogcapError;

/// 캡처 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// 정규식 컴파일 실패
    #[error("invalid regex '{pattern}': {reason}")]
    RuleCompile {
        /// 원본 패턴 문자열
        pattern: String,
        /// 컴파일 실패 사유
        reason: String,
    },

    /// 규칙 설정 값 오류 (음수 컨텍스트 등)
    #[error("invalid rule at index {index}: {reason}")]
    InvalidRule {
        /// 설정 목록에서의 위치 (0부터)
        index: usize,
        /// 사유
        reason: String,
    },

    /// 소스 로그 파일을 찾을 수 없거나 읽을 수 없음
    #[error("source log unavailable: {path}")]
    SourceUnavailable {
        /// 탐색한 경로
        path: PathBuf,
    },

    /// 소스 파일 읽기 실패
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// 소스 파일 경로
        path: PathBuf,
        /// 원인
        #[source]
        source: std::io::Error,
    },

    /// 출력 파일 쓰기 실패
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// 출력 파일 경로
        path: PathBuf,
        /// 원인
        #[source]
        source: std::io::Error,
    },

    /// 알림 전송 실패
    #[error("notification error: {0}")]
    Notify(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CaptureError> for LogcapError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Io(e) => LogcapError::Io(e),
            other => LogcapError::Capture(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_compile_error_display() {
        let err = CaptureError::RuleCompile {
            pattern: "[unclosed".to_owned(),
            reason: "unclosed character class".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("[unclosed"));
        assert!(msg.contains("unclosed character class"));
    }

    #[test]
    fn read_error_keeps_source() {
        let err = CaptureError::Read {
            path: PathBuf::from("logs/latest.log"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("logs/latest.log"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn converts_to_logcap_error() {
        let err = CaptureError::Notify("endpoint unreachable".to_owned());
        let top: LogcapError = err.into();
        assert!(matches!(top, LogcapError::Capture(_)));
    }

    #[test]
    fn io_converts_to_logcap_io() {
        let err = CaptureError::Io(std::io::Error::other("boom"));
        let top: LogcapError = err.into();
        assert!(matches!(top, LogcapError::Io(_)));
    }
}
