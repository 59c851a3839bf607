//! HTTP client for the local agent gateway used by the chat box.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PING_TIMEOUT: Duration = Duration::from_secs(2);
const CONNECTED_NOTICE: &str =
    "Connected to gateway. Press A to open a full agent chat in the project.";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway not connected")]
    NotConfigured,
    #[error("could not read gateway config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse gateway config {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gateway returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("{kind}: {message}")]
    Remote { kind: String, message: String },
    #[error("malformed gateway response: {0}")]
    Decode(serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    pub port: u16,
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    gateway: RawGateway,
}

#[derive(Debug, Default, Deserialize)]
struct RawGateway {
    port: Option<u16>,
    #[serde(default)]
    auth: RawAuth,
}

#[derive(Debug, Default, Deserialize)]
struct RawAuth {
    #[serde(default)]
    token: String,
}

impl GatewaySettings {
    pub fn load(path: &Path) -> Result<Self, GatewayError> {
        let contents = std::fs::read_to_string(path).map_err(|source| GatewayError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|err| match err {
            GatewayError::Decode(source) => GatewayError::ParseConfig {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, GatewayError> {
        let raw: RawConfig = serde_json::from_str(contents).map_err(GatewayError::Decode)?;
        let port = raw.gateway.port.ok_or(GatewayError::NotConfigured)?;
        Ok(Self {
            port,
            token: raw.gateway.auth.token,
        })
    }
}

#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    tool: &'a str,
    args: InvokeArgs<'a>,
}

#[derive(Debug, Serialize)]
struct InvokeArgs<'a> {
    message: &'a str,
    cwd: &'a str,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RemoteError>,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteError {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    token: String,
    tool: String,
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new(settings: GatewaySettings, tool: impl Into<String>) -> Self {
        Self {
            base_url: format!("http://localhost:{}", settings.port),
            token: settings.token,
            tool: tool.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn send_message(&self, message: &str, cwd: &Path) -> Result<String, GatewayError> {
        let cwd = cwd.to_string_lossy();
        let body = InvokeRequest {
            tool: &self.tool,
            args: InvokeArgs {
                message,
                cwd: &cwd,
            },
        };
        let response = self
            .http
            .post(format!("{}/tools/invoke", self.base_url))
            .bearer_auth(&self.token)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() && bytes.is_empty() {
            return Err(GatewayError::Status(status));
        }
        let decoded: InvokeResponse = serde_json::from_slice(&bytes).map_err(GatewayError::Decode)?;
        let result = into_result(decoded)?;
        Ok(reply_text(&result))
    }

    pub async fn ping(&self) -> Result<(), GatewayError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(PING_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status()));
        }
        Ok(())
    }
}

fn into_result(response: InvokeResponse) -> Result<Value, GatewayError> {
    if response.ok {
        return Ok(response.result);
    }
    let error = response.error.unwrap_or_default();
    Err(GatewayError::Remote {
        kind: if error.kind.is_empty() {
            "error".to_string()
        } else {
            error.kind
        },
        message: error.message,
    })
}

/// Picks the displayable reply out of a tool result.
pub fn reply_text(result: &Value) -> String {
    if let Some(status) = result
        .pointer("/details/statusText")
        .and_then(Value::as_str)
    {
        if let Some(line) = status
            .lines()
            .find(|line| line.contains("Model:") || line.contains("Context:"))
        {
            return line.trim().to_string();
        }
    }
    if let Some(text) = content_text(result.get("content")) {
        return text;
    }
    CONNECTED_NOTICE.to_string()
}

fn content_text(content: Option<&Value>) -> Option<String> {
    match content? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Array(parts) => {
            let joined: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .collect();
            (!joined.is_empty()).then(|| joined.join(" "))
        }
        _ => None,
    }
}
