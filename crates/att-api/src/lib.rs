//! HTTP client for the attendance backend.
//!
//! Provides the two calls the session tracker depends on:
//! - Fetching today's attendance snapshot
//! - Submitting a punch-out
//!
//! plus a manual punch-in used by the CLI.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use att_core::AttendanceSnapshot;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

/// Default request timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const TODAY_ATTENDANCE_PATH: &str = "employee/today-attendance";
const PUNCH_IN_PATH: &str = "employee/punch-in";
const PUNCH_OUT_PATH: &str = "employee/punch-out";

/// Attendance API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL cannot be used.
    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// The provided API token was invalid.
    #[error("invalid API token: {reason}")]
    InvalidToken { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed, including transport timeouts.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// The backend calls the tracker needs.
///
/// Implemented by [`Client`]; tests substitute in-memory backends.
pub trait AttendanceBackend: Send + Sync + 'static {
    /// Fetches today's attendance record. Idempotent.
    fn today_attendance(
        &self,
    ) -> impl Future<Output = Result<AttendanceSnapshot, ApiError>> + Send;

    /// Punches the employee out of the open session.
    fn punch_out(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Attendance API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed, if the token is
    /// empty or whitespace-only, or if the HTTP client fails to build.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(base_url)?;

        if let Some(token) = &token {
            if token.trim().is_empty() {
                return Err(ApiError::InvalidToken {
                    reason: "API token cannot be empty or whitespace-only",
                });
            }
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET employee/today-attendance`.
    pub async fn fetch_today_attendance(&self) -> Result<AttendanceSnapshot, ApiError> {
        let body = self.send(Method::GET, TODAY_ATTENDANCE_PATH).await?;
        let parsed = AttendanceSnapshot::from_json(&body)
            .map_err(|err| ApiError::InvalidResponse(err.to_string()))?;

        for issue in &parsed.issues {
            tracing::warn!(%issue, "malformed attendance snapshot");
        }
        tracing::debug!(
            sessions = parsed.snapshot.sessions.len(),
            total_hours = parsed.snapshot.total_hours,
            "fetched today's attendance"
        );
        Ok(parsed.snapshot)
    }

    /// `POST employee/punch-in`.
    pub async fn submit_punch_in(&self) -> Result<(), ApiError> {
        self.send(Method::POST, PUNCH_IN_PATH).await?;
        Ok(())
    }

    /// `POST employee/punch-out`.
    pub async fn submit_punch_out(&self) -> Result<(), ApiError> {
        self.send(Method::POST, PUNCH_OUT_PATH).await?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: err.to_string(),
            })
    }

    async fn send(&self, method: Method, path: &str) -> Result<String, ApiError> {
        let url = self.endpoint(path)?;
        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(status, &body).unwrap_or_else(|| ApiError::Api {
                status,
                message: body,
            }));
        }
        Ok(body)
    }
}

impl AttendanceBackend for Client {
    async fn today_attendance(&self) -> Result<AttendanceSnapshot, ApiError> {
        self.fetch_today_attendance().await
    }

    async fn punch_out(&self) -> Result<(), ApiError> {
        self.submit_punch_out().await
    }
}

/// Parses the base URL and makes sure relative joins append to its path.
fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_api_error(status: StatusCode, body: &str) -> Option<ApiError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| ApiError::Api {
            status,
            message: payload.message,
        })
}
