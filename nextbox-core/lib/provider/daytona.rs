//! Daytona REST API client.
//!
//! Sandboxes are managed through `{api_url}/sandbox/...` and commands and files go through the
//! toolbox proxy at `{api_url}/toolbox/{sandbox_id}/toolbox/...`. Every request carries the API
//! key as a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine};
use bytes::Bytes;
use reqwest::{multipart, Client, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{
    CreateSandboxParams, ExecuteRequest, ExecuteResponse, PreviewLink, Sandbox, SandboxProvider,
    SessionExecuteRequest, SessionExecuteResponse,
};
use crate::{config::ProviderConfig, NextboxError, NextboxResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Timeout for requests that do not set their own.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Extra time granted to the HTTP request on top of a command's own timeout.
const EXEC_TIMEOUT_GRACE: Duration = Duration::from_secs(30);

/// Delay between two sandbox state lookups while waiting for it to start.
const DEFAULT_STATE_POLL_INTERVAL: Duration = Duration::from_secs(1);

const STATE_STARTED: &str = "started";
const FAILED_STATES: &[&str] = &["error", "build_failed"];

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A [`SandboxProvider`] backed by the Daytona REST API.
#[derive(Debug, Clone)]
pub struct DaytonaProvider {
    config: ProviderConfig,
    http: Client,
    state_poll_interval: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSandboxBody {
    build_info: BuildInfo,
    cpu: u32,
    memory: u32,
    disk: u32,
    auto_stop_interval: u32,
    public: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfo {
    dockerfile_content: String,
    context_hashes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SandboxBody {
    id: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    public: bool,
    #[serde(default)]
    error_reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteBody<'a> {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cwd: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteResponseBody {
    exit_code: i32,
    #[serde(default)]
    result: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionBody<'a> {
    session_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionExecuteBody<'a> {
    command: &'a str,
    run_async: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionExecuteResponseBody {
    #[serde(default)]
    cmd_id: Option<String>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    exit_code: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct PreviewBody {
    url: String,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: serde_json::Value,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DaytonaProvider {
    /// Creates a client for the configured Daytona API.
    pub fn new(config: ProviderConfig) -> NextboxResult<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            config,
            http,
            state_poll_interval: DEFAULT_STATE_POLL_INTERVAL,
        })
    }

    /// Sets the delay between two state lookups while waiting for a sandbox to start.
    pub fn with_state_poll_interval(mut self, interval: Duration) -> Self {
        self.state_poll_interval = interval;
        self
    }

    /// Builds an API URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> NextboxResult<Url> {
        let mut url = self.config.get_api_url().clone();
        url.path_segments_mut()
            .map_err(|_| {
                NextboxError::InvalidConfig(format!(
                    "provider API URL `{}` cannot be a base",
                    self.config.get_api_url()
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Builds a toolbox URL for a sandbox.
    fn toolbox_endpoint(&self, sandbox_id: &str, segments: &[&str]) -> NextboxResult<Url> {
        let mut full = vec!["toolbox", sandbox_id, "toolbox"];
        full.extend_from_slice(segments);
        self.endpoint(&full)
    }

    /// Sends an authenticated request and turns non-success statuses into errors.
    async fn send(&self, request: RequestBuilder) -> NextboxResult<Response> {
        let response = request.bearer_auth(self.config.get_api_key()).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(ErrorBody {
                message: serde_json::Value::String(message),
            }) => message,
            Ok(ErrorBody { message }) => message.to_string(),
            Err(_) if !text.trim().is_empty() => text.trim().to_string(),
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        Err(NextboxError::ProviderResponse {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> NextboxResult<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_sandbox(&self, sandbox_id: &str) -> NextboxResult<SandboxBody> {
        let url = self.endpoint(&["sandbox", sandbox_id])?;
        let response = self.send(self.http.get(url)).await?;
        Self::decode(response).await
    }

    /// Polls the sandbox state until it is started, failed, or the timeout elapses.
    async fn wait_until_started(
        &self,
        mut sandbox: SandboxBody,
        timeout: Duration,
    ) -> NextboxResult<SandboxBody> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if sandbox.state == STATE_STARTED {
                return Ok(sandbox);
            }

            if FAILED_STATES.contains(&sandbox.state.as_str()) {
                return Err(NextboxError::SandboxStartFailed {
                    id: sandbox.id,
                    state: sandbox.state,
                    reason: sandbox
                        .error_reason
                        .unwrap_or_else(|| "no reason given".to_string()),
                });
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(NextboxError::Timeout(format!(
                    "sandbox {} did not start within {}s (last state `{}`)",
                    sandbox.id,
                    timeout.as_secs(),
                    sandbox.state
                )));
            }

            tracing::debug!(sandbox = %sandbox.id, state = %sandbox.state, "waiting for sandbox to start");
            tokio::time::sleep(self.state_poll_interval).await;
            sandbox = self.get_sandbox(&sandbox.id).await?;
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl SandboxProvider for DaytonaProvider {
    #[tracing::instrument(level = "debug", skip(self, params), fields(image = %params.image))]
    async fn create_sandbox(&self, params: &CreateSandboxParams) -> NextboxResult<Sandbox> {
        let body = CreateSandboxBody {
            build_info: BuildInfo {
                dockerfile_content: format!("FROM {}\n", params.image),
                context_hashes: Vec::new(),
            },
            cpu: params.resources.get_cpu(),
            memory: params.resources.get_memory(),
            disk: params.resources.get_disk(),
            auto_stop_interval: params.auto_stop_interval,
            public: false,
        };

        let url = self.endpoint(&["sandbox"])?;
        let response = self.send(self.http.post(url).json(&body)).await?;
        let created: SandboxBody = Self::decode(response).await?;

        if created.id.trim().is_empty() {
            return Err(NextboxError::InvalidResponse(
                "provider returned a sandbox without an id".to_string(),
            ));
        }

        tracing::debug!(sandbox = %created.id, state = %created.state, "sandbox created");
        let started = self.wait_until_started(created, params.start_timeout).await?;

        Ok(Sandbox {
            id: started.id,
            state: started.state,
            public: started.public,
        })
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn set_public(&self, sandbox_id: &str, public: bool) -> NextboxResult<()> {
        let flag = public.to_string();
        let url = self.endpoint(&["sandbox", sandbox_id, "public", &flag])?;
        self.send(self.http.post(url)).await?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, request), fields(cwd = ?request.cwd))]
    async fn execute_command(
        &self,
        sandbox_id: &str,
        request: &ExecuteRequest,
    ) -> NextboxResult<ExecuteResponse> {
        // Pipes, quotes and redirections survive the API only when the line is base64-wrapped.
        let encoded = BASE64_STANDARD.encode(request.command.as_bytes());
        let body = ExecuteBody {
            command: format!("sh -c \"echo '{}' | base64 -d | sh\"", encoded),
            cwd: request.cwd.as_deref(),
            timeout: request.timeout.map(|t| t.as_secs()),
        };

        let url = self.toolbox_endpoint(sandbox_id, &["process", "execute"])?;
        let mut builder = self.http.post(url).json(&body);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout + EXEC_TIMEOUT_GRACE);
        }

        let response = self.send(builder).await?;
        let body: ExecuteResponseBody = Self::decode(response).await?;

        Ok(ExecuteResponse {
            exit_code: body.exit_code,
            result: body.result,
        })
    }

    #[tracing::instrument(level = "debug", skip(self, content), fields(len = content.len()))]
    async fn upload_file(&self, sandbox_id: &str, path: &str, content: Bytes) -> NextboxResult<()> {
        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let part = multipart::Part::bytes(content.to_vec()).file_name(file_name);
        let form = multipart::Form::new().part("file", part);

        let url = self.toolbox_endpoint(sandbox_id, &["files", "upload"])?;
        self.send(self.http.post(url).query(&[("path", path)]).multipart(form))
            .await?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn download_file(&self, sandbox_id: &str, path: &str) -> NextboxResult<Bytes> {
        let url = self.toolbox_endpoint(sandbox_id, &["files", "download"])?;
        let response = self.send(self.http.get(url).query(&[("path", path)])).await?;
        Ok(response.bytes().await?)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn create_session(&self, sandbox_id: &str, session_id: &str) -> NextboxResult<()> {
        let url = self.toolbox_endpoint(sandbox_id, &["process", "session"])?;
        self.send(self.http.post(url).json(&CreateSessionBody { session_id }))
            .await?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, request), fields(run_async = request.run_async))]
    async fn execute_session_command(
        &self,
        sandbox_id: &str,
        session_id: &str,
        request: &SessionExecuteRequest,
    ) -> NextboxResult<SessionExecuteResponse> {
        let body = SessionExecuteBody {
            command: &request.command,
            run_async: request.run_async,
        };

        let url =
            self.toolbox_endpoint(sandbox_id, &["process", "session", session_id, "exec"])?;
        let response = self.send(self.http.post(url).json(&body)).await?;
        let body: SessionExecuteResponseBody = Self::decode(response).await?;

        Ok(SessionExecuteResponse {
            cmd_id: body.cmd_id,
            output: body.output,
            exit_code: body.exit_code,
        })
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_preview_link(&self, sandbox_id: &str, port: u16) -> NextboxResult<PreviewLink> {
        let port = port.to_string();
        let url = self.endpoint(&["sandbox", sandbox_id, "ports", &port, "preview-url"])?;
        let response = self.send(self.http.get(url)).await?;
        let body: PreviewBody = Self::decode(response).await?;

        let url = normalize_preview_url(&body.url);
        if url.is_empty() {
            return Err(NextboxError::InvalidResponse(format!(
                "provider returned an empty preview URL for sandbox {}",
                sandbox_id
            )));
        }

        Ok(PreviewLink {
            url,
            token: body.token.filter(|t| !t.is_empty()),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// Repairs preview URLs that lost a slash after the scheme or lack one entirely.
fn normalize_preview_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }

    for scheme in ["https:", "http:"] {
        if let Some(rest) = url.strip_prefix(scheme) {
            let host = rest.trim_start_matches('/');
            return format!("{}//{}", scheme, host);
        }
    }

    format!("https://{}", url)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
