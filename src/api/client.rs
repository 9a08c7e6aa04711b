//! Resilient HTTP client for the simulation authority.
//!
//! One shared request core handles the retry budget, the per-attempt
//! timeout, and transparent credential refresh; the endpoint methods stay
//! thin on top of it. No failure here is ever fatal to the run: exhausting
//! the budget resolves to "no data" and the caller proceeds degraded.

use std::sync::Mutex;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::traits::SimulationApi;
use crate::api::types::{EmergencyEvent, EventDto, Location, RawLocation, ResourceType};
use crate::config::EngineConfig;

/// Attempt-level failure classification for the retry loop.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("credential rejected ({0})")]
    Auth(u16),
    #[error("undecodable response body: {0}")]
    Decode(String),
}

#[derive(Debug)]
pub struct RemoteClient {
    base_url: String,
    username: String,
    password: String,
    seed: String,
    target_dispatches: u32,
    max_active_calls: u32,
    retry_count: u32,
    timeout: Duration,
    http: reqwest::Client,
    credentials: Mutex<Option<Credentials>>,
}

impl RemoteClient {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            base_url: config.api_host.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            seed: config.seed.clone(),
            target_dispatches: config.target_dispatches,
            max_active_calls: config.max_active_calls,
            retry_count: config.retry_count.max(1),
            timeout: config.timeout,
            http: reqwest::Client::new(),
            credentials: Mutex::new(None),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Option<String> {
        self.credentials
            .lock()
            .expect("credential mutex poisoned")
            .as_ref()
            .map(|credentials| credentials.token.clone())
    }

    /// One logical call under the retry budget. Returns the response body on
    /// a 2xx with a non-empty payload; an empty or missing payload resolves
    /// to `None` without retrying, and an exhausted budget degrades to
    /// `None` as well.
    async fn request(
        &self,
        label: &str,
        build: impl Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    ) -> Option<String> {
        for attempt in 1..=self.retry_count {
            let mut builder = build(&self.http).timeout(self.timeout);
            if let Some(token) = self.bearer() {
                builder = builder.bearer_auth(token);
            }

            let outcome = match builder.send().await {
                Err(error) if error.is_timeout() => Err(ApiError::Timeout(self.timeout)),
                Err(error) => Err(ApiError::Transport(error.to_string())),
                Ok(response) => {
                    let status = response.status().as_u16();
                    if status == 401 || status == 404 {
                        Err(ApiError::Auth(status))
                    } else if !response.status().is_success() {
                        Err(ApiError::Status(status))
                    } else {
                        match response.text().await {
                            Ok(body) => Ok(body),
                            Err(error) => Err(ApiError::Transport(error.to_string())),
                        }
                    }
                }
            };

            match outcome {
                Ok(body) => {
                    if body.trim().is_empty() {
                        // 200 with no payload: no data, not an error.
                        return None;
                    }
                    return Some(body);
                }
                Err(ApiError::Auth(status)) => {
                    tracing::warn!(
                        "{label}: credential rejected ({status}) on attempt {attempt}/{}, refreshing",
                        self.retry_count
                    );
                    self.refresh_auth().await;
                }
                Err(error) => {
                    tracing::warn!(
                        "{label}: attempt {attempt}/{} failed: {error}",
                        self.retry_count
                    );
                }
            }
        }

        tracing::error!(
            "{label}: no response after {} attempts, proceeding without data",
            self.retry_count
        );
        None
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        label: &str,
        build: impl Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    ) -> Option<T> {
        let body = self.request(label, build).await?;
        match serde_json::from_str(&body) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::debug!("{label}: {}", ApiError::Decode(error.to_string()));
                None
            }
        }
    }

    /// Obtain a fresh credential pair with the configured account.
    async fn authenticate(&self) {
        let response = self
            .http
            .post(self.endpoint("/auth/login"))
            .timeout(self.timeout)
            .json(&LoginRequest {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await;
        self.store_auth_response("login", response).await;
    }

    /// Exchange the held refresh token for a new credential pair, falling
    /// back to a full login when none is held or the exchange fails.
    async fn refresh_auth(&self) {
        let refresh_token = self
            .credentials
            .lock()
            .expect("credential mutex poisoned")
            .as_ref()
            .map(|credentials| credentials.refresh_token.clone());

        let Some(refresh_token) = refresh_token else {
            self.authenticate().await;
            return;
        };

        let response = self
            .http
            .post(self.endpoint("/auth/refreshToken"))
            .timeout(self.timeout)
            .bearer_auth(refresh_token)
            .send()
            .await;
        if !self.store_auth_response("token refresh", response).await {
            self.authenticate().await;
        }
    }

    /// Record the token pair from an auth response. Returns false when the
    /// response did not carry one.
    async fn store_auth_response(
        &self,
        label: &str,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> bool {
        let parsed: Option<AuthResponse> = match response {
            Err(error) => {
                tracing::warn!("{label} failed: {error}");
                None
            }
            Ok(response) if !response.status().is_success() => {
                tracing::warn!("{label} rejected with status {}", response.status());
                None
            }
            Ok(response) => match response.json::<AuthResponse>().await {
                Ok(auth) => Some(auth),
                Err(error) => {
                    tracing::warn!("{label} returned an undecodable body: {error}");
                    None
                }
            },
        };

        match parsed {
            Some(auth) => {
                *self.credentials.lock().expect("credential mutex poisoned") = Some(Credentials {
                    token: auth.token,
                    refresh_token: auth.refresh_token,
                });
                true
            }
            None => false,
        }
    }
}

impl SimulationApi for RemoteClient {
    async fn reset(&self) -> Option<String> {
        if self.bearer().is_none() {
            self.authenticate().await;
        }
        let target_dispatches = self.target_dispatches.to_string();
        let max_active_calls = self.max_active_calls.to_string();
        self.request("reset", |http| {
            http.post(self.endpoint("/control/reset")).query(&[
                ("seed", self.seed.as_str()),
                ("targetDispatches", target_dispatches.as_str()),
                ("maxActiveCalls", max_active_calls.as_str()),
            ])
        })
        .await
    }

    async fn stop(&self) -> Option<String> {
        self.request("stop", |http| http.post(self.endpoint("/control/stop")))
            .await
    }

    async fn next_event(&self) -> Option<EmergencyEvent> {
        let dto: EventDto = self
            .request_json("next event", |http| http.get(self.endpoint("/calls/next")))
            .await?;
        Some(EmergencyEvent::from(dto))
    }

    async fn discover(&self, resource: ResourceType) -> Vec<RawLocation> {
        let path = format!("/{resource}/search");
        self.request_json(&format!("discover {resource}"), |http| {
            http.get(self.endpoint(&path))
        })
        .await
        .unwrap_or_default()
    }

    async fn quantity_at(&self, resource: ResourceType, city: &str, county: &str) -> i64 {
        let path = format!("/{resource}/searchbycity");
        self.request_json(&format!("{resource} quantity at {city}"), |http| {
            http.get(self.endpoint(&path))
                .query(&[("city", city), ("county", county)])
        })
        .await
        .unwrap_or(0)
    }

    /// Not idempotent-safe: a dispatch that succeeded but whose response was
    /// lost may be re-issued by the retry loop and double-allocate. Needs
    /// are only decremented on a confirmed response.
    async fn dispatch(
        &self,
        resource: ResourceType,
        source: &Location,
        target: &EmergencyEvent,
        quantity: i64,
    ) -> bool {
        let path = format!("/{resource}/dispatch");
        let body = DispatchRequest {
            source_city: &source.city,
            source_county: &source.county,
            target_city: &target.city,
            target_county: &target.county,
            quantity,
        };
        self.request(
            &format!("dispatch {quantity} {resource} from {}", source.city),
            |http| http.post(self.endpoint(&path)).json(&body),
        )
        .await
        .is_some()
    }
}

// ---------------------------------------------------------------------------
// Wire DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Credentials {
    token: String,
    refresh_token: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

#[derive(Debug, Serialize)]
struct DispatchRequest<'a> {
    #[serde(rename = "sourceCity")]
    source_city: &'a str,
    #[serde(rename = "sourceCounty")]
    source_county: &'a str,
    #[serde(rename = "targetCity")]
    target_city: &'a str,
    #[serde(rename = "targetCounty")]
    target_county: &'a str,
    quantity: i64,
}
