// HTTP executor client
//
// One JSON request per call. No retries here: a failed commit is re-submitted by the user.

use super::{ConnectorExecutor, DetailSaveClient};
use crate::config::ExecutorSettings;
use crate::error::ExecutorError;
use crate::forms::form::FormData;
use crate::models::descriptor::ConnectorDescriptor;
use crate::utils::logging::mask_metadata;
use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use url::Url;

pub const EXECUTE_PATH: &str = "connector-types/execute";
pub const LOAD_PATH: &str = "connector-types/load";

pub struct HttpExecutor {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
    auth_token: Option<String>,
}

impl HttpExecutor {
    pub fn new(settings: &ExecutorSettings) -> Result<Self> {
        let base = normalize_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("console-wizard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base,
            timeout: Duration::from_secs(settings.timeout_secs.max(1)),
            auth_token: settings
                .auth_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn send_json<B, R>(&self, method: Method, path: &str, body: &B) -> Result<R, ExecutorError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| ExecutorError::Transport {
                details: format!("invalid request path '{}': {}", path, e),
            })?;

        let mut request = self.client.request(method.clone(), url.clone()).json(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let started = Instant::now();
        let response = match timeout(self.timeout, request.send()).await {
            Err(_) => {
                warn!(
                    "[PHASE: executor] [STEP: request] {} {} timed out after {}s",
                    method,
                    url,
                    self.timeout.as_secs()
                );
                return Err(ExecutorError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
            Ok(Err(e)) => {
                return Err(ExecutorError::Transport {
                    details: e.to_string(),
                })
            }
            Ok(Ok(r)) => r,
        };

        let status = response.status();
        debug!(
            "[PHASE: executor] [STEP: request] {} {} -> {} (duration_ms={})",
            method,
            url,
            status.as_u16(),
            started.elapsed().as_millis()
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutorError::Rejected {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExecutorError::Transport {
                details: e.to_string(),
            })?;
        serde_json::from_slice(&bytes).map_err(|e| ExecutorError::Decode {
            details: e.to_string(),
        })
    }
}

#[async_trait]
impl ConnectorExecutor for HttpExecutor {
    async fn execute(
        &self,
        descriptor: ConnectorDescriptor,
    ) -> Result<ConnectorDescriptor, ExecutorError> {
        debug!(
            "[PHASE: executor] [STEP: {}] execute metadata={:?}",
            descriptor.current_step_name.as_deref().unwrap_or("-"),
            mask_metadata(&descriptor.metadata)
        );
        self.send_json(Method::POST, EXECUTE_PATH, &descriptor).await
    }

    async fn load(
        &self,
        descriptor: ConnectorDescriptor,
    ) -> Result<ConnectorDescriptor, ExecutorError> {
        self.send_json(Method::POST, LOAD_PATH, &descriptor).await
    }
}

#[async_trait]
impl DetailSaveClient for HttpExecutor {
    async fn save(&self, resource: &str, payload: FormData) -> Result<FormData, ExecutorError> {
        self.send_json(Method::PUT, resource.trim_start_matches('/'), &payload)
            .await
    }
}

/// Parse the configured base URL and make sure relative joins append to its path.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow::anyhow!("Executor base URL is required"));
    }
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| anyhow::anyhow!("Executor base URL '{}' is invalid: {}", trimmed, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow::anyhow!(
            "Executor base URL must use http or https (got '{}')",
            other
        )),
    }
}

/// Pull a human message out of an error body (`{"error":{"message":..}}`,
/// `{"message":..}`) or fall back to the raw text.
pub fn extract_error_message(body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
        let candidates = [
            v.pointer("/error/message"),
            v.pointer("/_errors/0/message"),
            v.get("message"),
            v.get("error"),
        ];
        for c in candidates.into_iter().flatten() {
            if let Some(s) = c.as_str().filter(|s| !s.trim().is_empty()) {
                return s.to_string();
            }
        }
    }
    let text = body.trim();
    text.chars().take(300).collect()
}
