//! 설정 관리 -- logcap 설정 파일 파싱 및 런타임 설정
//!
//! [`LogcapConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, daemon에서 적용)
//! 2. 환경변수 (`LOGCAP_CAPTURE_WEBHOOK_URL=...` 형식)
//! 3. 설정 파일 (`logcap.toml` 또는 `config.yml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 파일 형식
//! 확장자가 `.toml`이면 TOML, 그 외에는 YAML로 파싱합니다.
//! `[capture]` 섹션의 키는 kebab-case(`log-file-path`, `max-file-size-mb`)를 사용합니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logcap_core::error::LogcapError> {
//! use logcap_core::config::LogcapConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogcapConfig::load("logcap.toml").await?;
//!
//! // YAML 문자열에서 직접 파싱
//! let config = LogcapConfig::parse_yaml("capture:\n  max-file-size-mb: 5")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogcapError};

/// logcap 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogcapConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 캡처 엔진 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl LogcapConfig {
    /// 설정 파일을 로드하고 환경변수 오버라이드를 적용한 뒤 검증합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogcapError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일을 로드합니다 (환경변수 오버라이드 없음).
    ///
    /// 검증은 수행하지 않습니다. 환경변수가 잘못된 값을 고칠 수 있기 때문입니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogcapError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogcapError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogcapError::Io(e)
            }
        })?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        if is_toml {
            Self::parse_toml(&content)
        } else {
            Self::parse_yaml(&content)
        }
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse_toml(toml_str: &str) -> Result<Self, LogcapError> {
        toml::from_str(toml_str).map_err(|e| {
            LogcapError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// YAML 문자열에서 설정을 파싱합니다.
    ///
    /// 빈 문서는 기본값으로 취급합니다.
    pub fn parse_yaml(yaml_str: &str) -> Result<Self, LogcapError> {
        if yaml_str.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml_str).map_err(|e| {
            LogcapError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGCAP_{SECTION}_{FIELD}`
    /// 예: `LOGCAP_CAPTURE_LOG_FILE_PATH=/srv/mc/logs/latest.log`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGCAP_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGCAP_GENERAL_LOG_FORMAT");
        override_parsed(
            &mut self.general.tick_interval_ms,
            "LOGCAP_GENERAL_TICK_INTERVAL_MS",
        );

        // Capture
        override_string(
            &mut self.capture.log_file_path,
            "LOGCAP_CAPTURE_LOG_FILE_PATH",
        );
        override_csv(
            &mut self.capture.fallback_paths,
            "LOGCAP_CAPTURE_FALLBACK_PATHS",
        );
        override_parsed(
            &mut self.capture.max_file_size_mb,
            "LOGCAP_CAPTURE_MAX_FILE_SIZE_MB",
        );
        override_string(&mut self.capture.webhook_url, "LOGCAP_CAPTURE_WEBHOOK_URL");
        override_string(&mut self.capture.output_dir, "LOGCAP_CAPTURE_OUTPUT_DIR");
        override_parsed(
            &mut self.capture.notify_timeout_secs,
            "LOGCAP_CAPTURE_NOTIFY_TIMEOUT_SECS",
        );
        override_parsed(
            &mut self.capture.max_queue_lines,
            "LOGCAP_CAPTURE_MAX_QUEUE_LINES",
        );
        override_parsed(
            &mut self.capture.rediscover_source,
            "LOGCAP_CAPTURE_REDISCOVER_SOURCE",
        );

        // Metrics
        override_parsed(&mut self.metrics.enabled, "LOGCAP_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "LOGCAP_METRICS_LISTEN_ADDR");
        override_parsed(&mut self.metrics.port, "LOGCAP_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 정규식 패턴은 여기서 검증하지 않습니다. 잘못된 패턴은 캡처 엔진이
    /// 규칙 단위로 건너뛰기 때문입니다.
    pub fn validate(&self) -> Result<(), LogcapError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.general.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.tick_interval_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.capture.output_dir.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "capture.output-dir".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.capture.max_queue_lines == 0 {
            return Err(ConfigError::InvalidValue {
                field: "capture.max-queue-lines".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        let webhook = self.capture.webhook_url.trim();
        if !webhook.is_empty() && !(webhook.starts_with("http://") || webhook.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                field: "capture.webhook-url".to_owned(),
                reason: format!("'{webhook}' must start with http:// or https://"),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// tick 주기 (밀리초)
    pub tick_interval_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            tick_interval_ms: 2000,
        }
    }
}

/// 캡처 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CaptureConfig {
    /// 감시할 소스 로그 파일 경로
    pub log_file_path: String,
    /// 설정 경로를 읽을 수 없을 때 순서대로 시도할 경로
    pub fallback_paths: Vec<String>,
    /// 출력 파일 로테이션 임계값 (MB)
    pub max_file_size_mb: u64,
    /// 패턴 규칙 목록
    pub regex_patterns: Vec<PatternConfig>,
    /// 웹훅 URL (빈 문자열이면 알림 비활성화)
    pub webhook_url: String,
    /// 출력 파일 디렉토리
    pub output_dir: String,
    /// 웹훅 요청 타임아웃 (초)
    pub notify_timeout_secs: u64,
    /// 플러시 대기 큐 최대 라인 수
    pub max_queue_lines: usize,
    /// 소스 파일을 찾지 못했을 때 매 tick마다 다시 탐색할지 여부
    pub rediscover_source: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            log_file_path: "logs/latest.log".to_owned(),
            fallback_paths: vec![
                "logs/latest.log".to_owned(),
                "../logs/latest.log".to_owned(),
                "server.log".to_owned(),
                "../server.log".to_owned(),
            ],
            max_file_size_mb: 10,
            regex_patterns: Vec::new(),
            webhook_url: String::new(),
            output_dir: "captured".to_owned(),
            notify_timeout_secs: 10,
            max_queue_lines: 100_000,
            rediscover_source: true,
        }
    }
}

/// 단일 패턴 규칙 설정
///
/// `above`/`below`는 음수가 들어올 수 있도록 부호 있는 정수로 받습니다.
/// 음수 규칙은 캡처 엔진이 경고와 함께 건너뜁니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    /// 정규식 패턴 (없거나 비어 있으면 무시)
    #[serde(default)]
    pub regex: Option<String>,
    /// 매칭 라인 앞쪽 컨텍스트 라인 수
    #[serde(default)]
    pub above: i64,
    /// 매칭 라인 뒤쪽 컨텍스트 라인 수
    #[serde(default)]
    pub below: i64,
}

impl PatternConfig {
    /// 새 패턴 설정을 생성합니다.
    pub fn new(regex: impl Into<String>, above: i64, below: i64) -> Self {
        Self {
            regex: Some(regex.into()),
            above,
            below,
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9187,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T: FromStr>(target: &mut T, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                expected = std::any::type_name::<T>(),
                "failed to parse env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
