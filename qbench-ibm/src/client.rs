//! Blocking HTTP client for the IBM Quantum REST API
//!
//! The `Backend` and `Job` traits are synchronous, so every request runs to
//! completion on a current-thread tokio runtime owned by the client.

use crate::credentials::Credentials;
use crate::error::{IBMError, Result};
use log::debug;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// Per-request timeout (seconds)
const REQUEST_TIMEOUT: u64 = 30;

/// Retry delay assumed when a 429 carries no `Retry-After`
const DEFAULT_RATE_LIMIT_DELAY: u64 = 60;

pub struct IbmClient {
    http: Client,
    credentials: Credentials,
    runtime: Runtime,
}

impl IbmClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        credentials.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT))
            .build()?;
        let runtime = Builder::new_current_thread().enable_all().build()?;

        Ok(Self {
            http,
            credentials,
            runtime,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Absolute URL of an API path
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.credentials.api_url(),
            path.trim_start_matches('/')
        )
    }

    /// GET `path` and decode the JSON body
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        self.runtime.block_on(self.send(self.http.get(&url)))
    }

    /// GET `path` with query parameters
    pub fn get_with_query<Q, T>(&self, path: &str, query: &Q) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("GET {} (with query)", url);
        self.runtime.block_on(self.send(self.http.get(&url).query(query)))
    }

    /// POST a JSON body to `path` and decode the JSON answer
    pub fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {}", url);
        self.runtime.block_on(self.send(self.http.post(&url).json(body)))
    }

    /// Block the calling thread for `duration`
    pub fn pause(&self, duration: Duration) {
        self.runtime.block_on(tokio::time::sleep(duration));
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.authorize(request).send().await?;
        decode(response).await
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Authorization", self.credentials.auth_header());
        match self.credentials.instance() {
            Some(instance) => request.header("Service-CRN", instance),
            None => request,
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();

    if status.as_u16() == 429 {
        let delay = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_DELAY);
        return Err(IBMError::RateLimitExceeded(delay));
    }

    if status.as_u16() == 401 {
        return Err(IBMError::InvalidToken("Rejected by the API".into()));
    }

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(IBMError::ApiErrorStructured {
            code: status.as_u16(),
            message,
        });
    }

    Ok(response.json().await?)
}

/// Map a 404 from a job endpoint to [`IBMError::JobNotFound`]
pub(crate) fn job_not_found(err: IBMError, job_id: &str) -> IBMError {
    match err {
        IBMError::ApiErrorStructured { code: 404, .. } => {
            IBMError::JobNotFound(job_id.to_string())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef0123";

    #[test]
    fn test_client_requires_valid_token() {
        assert!(matches!(
            IbmClient::new(Credentials::new("nope")),
            Err(IBMError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_url_joins_paths() {
        let client =
            IbmClient::new(Credentials::new(TOKEN).with_api_url("http://localhost:9000/")).unwrap();

        assert_eq!(client.url("/jobs/abc"), "http://localhost:9000/jobs/abc");
        assert_eq!(client.url("backends"), "http://localhost:9000/backends");
    }

    #[test]
    fn test_404_becomes_job_not_found() {
        let err = job_not_found(
            IBMError::ApiErrorStructured {
                code: 404,
                message: "no such job".into(),
            },
            "job-9",
        );
        assert!(matches!(err, IBMError::JobNotFound(ref id) if id == "job-9"));

        let err = job_not_found(
            IBMError::ApiErrorStructured {
                code: 500,
                message: "oops".into(),
            },
            "job-9",
        );
        assert!(matches!(err, IBMError::ApiErrorStructured { code: 500, .. }));
    }
}
