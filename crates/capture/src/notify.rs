//! 웹훅 알림 싱크 -- 캡처 라인의 best-effort 전달
//!
//! 각 라인은 독립된 tokio 태스크에서 HTTP POST 한 번으로 전송됩니다.
//! 재시도, 백오프, 전달 확인은 없으며 실패는 로그와 메트릭으로만 남습니다.
//! 호출자(tick 경로)는 전송 결과를 기다리지 않습니다.
//!
//! # 페이로드
//! ```json
//! {"content": "```MATCH [ERROR]: ...```"}
//! ```

use std::time::Duration;

use logcap_core::metrics as m;
use tokio_util::task::TaskTracker;

use crate::error::CaptureError;

/// 웹훅 알림 싱크
///
/// 엔드포인트가 없으면 모든 호출이 no-op입니다.
#[derive(Debug, Clone)]
pub struct NotificationSink {
    client: reqwest::Client,
    endpoint: Option<String>,
    tracker: TaskTracker,
}

impl NotificationSink {
    /// 엔드포인트와 요청 타임아웃으로 싱크를 생성합니다.
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            endpoint,
            tracker: TaskTracker::new(),
        }
    }

    /// 비활성 싱크를 생성합니다.
    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(10))
    }

    /// 알림이 활성화되어 있는지 확인합니다.
    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// 설정된 엔드포인트
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// 전송 중인 알림 수
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// 라인을 코드 블록으로 감싼 JSON 페이로드를 생성합니다.
    pub fn payload(line: &str) -> serde_json::Value {
        serde_json::json!({ "content": format!("```{line}```") })
    }

    /// 라인을 비동기로 전송합니다 (fire-and-forget).
    ///
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn notify(&self, line: &str) {
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };
        let client = self.client.clone();
        let payload = Self::payload(line);

        self.tracker.spawn(async move {
            match deliver(&client, &endpoint, &payload).await {
                Ok(()) => {
                    metrics::counter!(m::NOTIFICATIONS_TOTAL, m::LABEL_RESULT => "success")
                        .increment(1);
                }
                Err(e) => {
                    metrics::counter!(m::NOTIFICATIONS_TOTAL, m::LABEL_RESULT => "failure")
                        .increment(1);
                    tracing::warn!(error = %e, "failed to send webhook notification");
                }
            }
        });
    }

    /// 엔드포인트와 타임아웃을 교체합니다.
    ///
    /// 이미 전송 중인 알림은 이전 설정으로 끝까지 진행됩니다.
    pub fn reconfigure(&mut self, endpoint: Option<String>, timeout: Duration) {
        if endpoint.is_some() != self.endpoint.is_some() {
            tracing::info!(enabled = endpoint.is_some(), "webhook notifications toggled");
        }
        self.client = build_client(timeout);
        self.endpoint = endpoint;
    }

    /// 전송 중인 알림을 최대 `grace`만큼 기다립니다.
    ///
    /// 모두 끝나면 `true`, 시간이 초과되어 남은 알림을 포기하면 `false`를 반환합니다.
    pub async fn close(&self, grace: Duration) -> bool {
        self.tracker.close();
        if self.tracker.is_empty() {
            return true;
        }

        let remaining = self.tracker.len();
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    abandoned = self.tracker.len(),
                    waited_for = remaining,
                    "notification grace period elapsed, abandoning in-flight notifications"
                );
                false
            }
        }
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to build webhook client, using defaults");
            reqwest::Client::new()
        })
}

async fn deliver(
    client: &reqwest::Client,
    endpoint: &str,
    payload: &serde_json::Value,
) -> Result<(), CaptureError> {
    let response = client
        .post(endpoint)
        .json(payload)
        .send()
        .await
        .map_err(|e| CaptureError::Notify(e.to_string()))?;
    response
        .error_for_status()
        .map_err(|e| CaptureError::Notify(e.to_string()))?;
    Ok(())
}
