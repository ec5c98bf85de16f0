use super::messages::{JobOptions, JobRequest, JobState, JobStatus, JobSubmission};
use crate::error::{ClientError, ClientResult};
use base64::Engine;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Polling cadence for `wait_for_completion`
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(3600),
        }
    }
}

/// HTTP client for the batch transcription API
#[derive(Debug, Clone)]
pub struct BatchClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl BatchClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Submit a prepared job and return the server-issued id
    pub async fn submit(&self, request: &JobRequest) -> ClientResult<JobSubmission> {
        let response = self
            .client
            .post(&self.api_url)
            .header("X-API-Key", &self.api_key)
            .json(request)
            .timeout(SUBMIT_TIMEOUT)
            .send()
            .await?;

        let response = Self::check(response, None).await?;
        let body: Value = response.json().await?;

        let id = match body.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(ClientError::Protocol(
                    "job id missing from submission response".to_string(),
                ))
            }
        };

        let extra = match body {
            Value::Object(mut map) => {
                map.remove("id");
                map
            }
            _ => serde_json::Map::new(),
        };

        info!("Batch job submitted: {}", id);
        Ok(JobSubmission { id, extra })
    }

    /// Read an audio file, base64-encode it and submit it as a job
    pub async fn submit_file(
        &self,
        path: impl AsRef<Path>,
        options: &JobOptions,
    ) -> ClientResult<JobSubmission> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ClientError::Io(format!("cannot read audio file {}: {}", path.display(), e))
        })?;

        info!(
            "Submitting {} ({} bytes, language={}, task={})",
            path.display(),
            bytes.len(),
            options.language,
            if options.translate { "translate" } else { "transcribe" }
        );

        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        self.submit(&JobRequest::new(encoded, options)).await
    }

    /// Fetch the current status of a job
    pub async fn status(&self, job_id: &str) -> ClientResult<JobStatus> {
        let response = self
            .client
            .get(format!("{}/{}", self.api_url, job_id))
            .header("X-API-Key", &self.api_key)
            .timeout(STATUS_TIMEOUT)
            .send()
            .await?;

        let response = Self::check(response, Some(job_id)).await?;
        Ok(response.json().await?)
    }

    /// Poll until the job reaches a terminal status or the deadline passes
    ///
    /// Transient failures while fetching the status are logged and retried
    /// on the next tick.
    pub async fn wait_for_completion(
        &self,
        job_id: &str,
        poll: PollOptions,
    ) -> ClientResult<JobStatus> {
        let started = Instant::now();
        let deadline = started + poll.timeout;
        let mut last_status: Option<String> = None;
        let mut status_since = Instant::now();

        info!("Waiting for job {} to complete", job_id);

        let timed_out = || {
            ClientError::Timeout(format!(
                "job {} did not finish within {:.1}s",
                job_id,
                poll.timeout.as_secs_f64()
            ))
        };

        loop {
            if Instant::now() >= deadline {
                return Err(timed_out());
            }

            // A hung status request must not outlive the caller's deadline
            let fetched = tokio::time::timeout_at(deadline, self.status(job_id))
                .await
                .map_err(|_| timed_out())?;

            let status = match fetched {
                Ok(status) => status,
                Err(e) => {
                    error!("Failed to get job status: {}", e);
                    Self::pause(poll.interval, deadline).await;
                    continue;
                }
            };

            match status.state() {
                JobState::Succeeded => {
                    info!(
                        "Job completed successfully in {:.2}s",
                        started.elapsed().as_secs_f64()
                    );
                    return Ok(status);
                }
                JobState::Failed(tag) => {
                    warn!("Job {} failed with status {}", job_id, tag);
                    return Err(ClientError::JobFailed(tag));
                }
                JobState::Pending(current) => {
                    if current != last_status {
                        info!("Job status: {}", current.as_deref().unwrap_or("unknown"));
                        last_status = current;
                        status_since = Instant::now();
                    } else if status_since.elapsed() >= HEARTBEAT_INTERVAL {
                        info!(
                            "Still processing... (status: {})",
                            current.as_deref().unwrap_or("unknown")
                        );
                        status_since = Instant::now();
                    }
                }
            }

            Self::pause(poll.interval, deadline).await;
        }
    }

    /// Sleep one poll interval, cut short at the deadline
    async fn pause(interval: Duration, deadline: Instant) {
        tokio::time::sleep_until(std::cmp::min(Instant::now() + interval, deadline)).await;
    }

    async fn check(response: Response, job_id: Option<&str>) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match (status, job_id) {
            (StatusCode::UNAUTHORIZED, _) => {
                ClientError::Authentication("please check your API key".to_string())
            }
            (StatusCode::FORBIDDEN, _) => {
                ClientError::Authentication("access forbidden, check your permissions".to_string())
            }
            (StatusCode::BAD_REQUEST, _) => ClientError::Protocol(format!("bad request: {}", body)),
            (StatusCode::NOT_FOUND, Some(id)) => ClientError::Protocol(format!("job not found: {}", id)),
            (other, _) => {
                ClientError::Connection(format!("HTTP error {}: {}", other.as_u16(), body))
            }
        })
    }
}
