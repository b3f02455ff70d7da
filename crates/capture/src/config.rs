//! 캡처 엔진 런타임 설정
//!
//! [`CaptureSettings`]는 core의 [`CaptureConfig`](logcap_core::config::CaptureConfig)를
//! 엔진이 바로 쓸 수 있는 형태(바이트 단위 임계값, `Duration`, `Option` 엔드포인트)로
//! 변환한 설정입니다.
//!
//! # 사용 예시
//! ```ignore
//! use logcap_core::config::LogcapConfig;
//! use logcap_capture::config::CaptureSettings;
//!
//! let core_config = LogcapConfig::default();
//! let settings = CaptureSettings::from_core(&core_config.capture);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use logcap_core::config::{CaptureConfig, PatternConfig};

use crate::error::CaptureError;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// 캡처 엔진 설정
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// 감시할 소스 로그 파일
    pub log_file_path: PathBuf,
    /// 설정 경로를 읽을 수 없을 때 시도할 경로 목록
    pub fallback_paths: Vec<PathBuf>,
    /// 출력 파일 로테이션 임계값 (바이트)
    pub max_file_size_bytes: u64,
    /// 패턴 규칙 원본 설정
    pub patterns: Vec<PatternConfig>,
    /// 웹훅 엔드포인트. None이면 알림 비활성화.
    pub webhook_url: Option<String>,
    /// 출력 파일 디렉토리
    pub output_dir: PathBuf,
    /// 웹훅 요청 타임아웃
    pub notify_timeout: Duration,
    /// 플러시 대기 큐 최대 라인 수
    pub max_queue_lines: usize,
    /// 소스를 찾지 못했을 때 매 tick 재탐색 여부
    pub rediscover_source: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self::from_core(&CaptureConfig::default())
    }
}

impl CaptureSettings {
    /// core의 `CaptureConfig`에서 엔진 설정을 생성합니다.
    ///
    /// 빈 웹훅 URL은 `None`으로 정규화됩니다.
    pub fn from_core(core: &CaptureConfig) -> Self {
        let webhook = core.webhook_url.trim();
        Self {
            log_file_path: PathBuf::from(&core.log_file_path),
            fallback_paths: core.fallback_paths.iter().map(PathBuf::from).collect(),
            max_file_size_bytes: core.max_file_size_mb.saturating_mul(BYTES_PER_MB),
            patterns: core.regex_patterns.clone(),
            webhook_url: (!webhook.is_empty()).then(|| webhook.to_owned()),
            output_dir: PathBuf::from(&core.output_dir),
            notify_timeout: Duration::from_secs(core.notify_timeout_secs),
            max_queue_lines: core.max_queue_lines,
            rediscover_source: core.rediscover_source,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(CaptureError::Config {
                field: "output_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.max_queue_lines == 0 {
            return Err(CaptureError::Config {
                field: "max_queue_lines".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.notify_timeout.is_zero() && self.webhook_url.is_some() {
            return Err(CaptureError::Config {
                field: "notify_timeout".to_owned(),
                reason: "must be greater than 0 when a webhook is configured".to_owned(),
            });
        }

        Ok(())
    }

    /// 소스 탐색 후보 목록을 우선순위 순으로 반환합니다.
    ///
    /// 설정 경로가 첫 번째이며, 중복 경로는 한 번만 포함됩니다.
    pub fn source_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = vec![self.log_file_path.clone()];
        for path in &self.fallback_paths {
            if !candidates.contains(path) {
                candidates.push(path.clone());
            }
        }
        candidates
    }
}

/// 캡처 설정 빌더
///
/// 테스트와 임베딩 호스트에서 설정 파일 없이 엔진을 구성할 때 사용합니다.
#[derive(Default)]
pub struct CaptureSettingsBuilder {
    settings: CaptureSettings,
}

impl CaptureSettingsBuilder {
    /// 기본값으로 시작하는 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 소스 로그 파일 경로를 설정합니다.
    pub fn log_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.log_file_path = path.into();
        self
    }

    /// 폴백 경로 목록을 설정합니다.
    pub fn fallback_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.settings.fallback_paths = paths;
        self
    }

    /// 로테이션 임계값을 바이트 단위로 설정합니다.
    pub fn max_file_size_bytes(mut self, bytes: u64) -> Self {
        self.settings.max_file_size_bytes = bytes;
        self
    }

    /// 패턴 규칙을 추가합니다.
    pub fn pattern(mut self, regex: impl Into<String>, above: i64, below: i64) -> Self {
        self.settings
            .patterns
            .push(PatternConfig::new(regex, above, below));
        self
    }

    /// 웹훅 엔드포인트를 설정합니다.
    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.settings.webhook_url = Some(url.into());
        self
    }

    /// 출력 디렉토리를 설정합니다.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.output_dir = dir.into();
        self
    }

    /// 웹훅 타임아웃을 설정합니다.
    pub fn notify_timeout(mut self, timeout: Duration) -> Self {
        self.settings.notify_timeout = timeout;
        self
    }

    /// 큐 최대 라인 수를 설정합니다.
    pub fn max_queue_lines(mut self, max: usize) -> Self {
        self.settings.max_queue_lines = max;
        self
    }

    /// 소스 재탐색 여부를 설정합니다.
    pub fn rediscover_source(mut self, enabled: bool) -> Self {
        self.settings.rediscover_source = enabled;
        self
    }

    /// 설정을 검증하고 `CaptureSettings`를 생성합니다.
    pub fn build(self) -> Result<CaptureSettings, CaptureError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        CaptureSettings::default().validate().unwrap();
    }

    #[test]
    fn from_core_converts_units() {
        let core = CaptureConfig {
            max_file_size_mb: 3,
            notify_timeout_secs: 4,
            webhook_url: "  https://hooks.example.com/a  ".to_owned(),
            ..Default::default()
        };
        let settings = CaptureSettings::from_core(&core);
        assert_eq!(settings.max_file_size_bytes, 3 * 1024 * 1024);
        assert_eq!(settings.notify_timeout, Duration::from_secs(4));
        assert_eq!(
            settings.webhook_url.as_deref(),
            Some("https://hooks.example.com/a")
        );
    }

    #[test]
    fn empty_webhook_disables_notifications() {
        let settings = CaptureSettings::from_core(&CaptureConfig::default());
        assert!(settings.webhook_url.is_none());
    }

    #[test]
    fn zero_megabytes_is_zero_bytes() {
        let core = CaptureConfig {
            max_file_size_mb: 0,
            ..Default::default()
        };
        assert_eq!(CaptureSettings::from_core(&core).max_file_size_bytes, 0);
    }

    #[test]
    fn source_candidates_dedupe_configured_path() {
        let settings = CaptureSettings::default();
        let candidates = settings.source_candidates();
        assert_eq!(candidates[0], PathBuf::from("logs/latest.log"));
        assert_eq!(
            candidates
                .iter()
                .filter(|p| **p == PathBuf::from("logs/latest.log"))
                .count(),
            1
        );
        assert_eq!(candidates.len(), 4);
    }

    #[test]
    fn builder_rejects_zero_queue() {
        assert!(CaptureSettingsBuilder::new().max_queue_lines(0).build().is_err());
    }

    #[test]
    fn builder_collects_patterns() {
        let settings = CaptureSettingsBuilder::new()
            .pattern("ERROR", 1, 1)
            .pattern("WARN", 0, 0)
            .build()
            .unwrap();
        assert_eq!(settings.patterns.len(), 2);
        assert_eq!(settings.patterns[0].regex.as_deref(), Some("ERROR"));
    }
}
