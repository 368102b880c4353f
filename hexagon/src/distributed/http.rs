//! Reference HTTP transport for `RemoteNodeExecutor` (spec §4.8 "HTTP
//! transport"): `POST /api/v1/nodes/{name}/execute` with
//! `{node_name, state_data}`, state bytes base64-wrapped by the JSON
//! encoder; health at `GET /api/v1/health`.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::distributed::error::DistributedError;
use crate::distributed::executor::RemoteNodeExecutor;

#[derive(Debug, Clone)]
pub struct HttpRemoteExecutorConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
}

impl HttpRemoteExecutorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            headers: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

pub struct HttpRemoteExecutor {
    name: String,
    client: reqwest::Client,
    config: HttpRemoteExecutorConfig,
}

impl HttpRemoteExecutor {
    pub fn new(name: impl Into<String>, config: HttpRemoteExecutorConfig) -> Result<Self, DistributedError> {
        let name = name.into();
        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| DistributedError::Transport {
                executor: name.clone(),
                source: e.to_string(),
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| DistributedError::Transport {
                executor: name.clone(),
                source: e.to_string(),
            })?;
            headers.insert(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| DistributedError::Transport { executor: name.clone(), source: e.to_string() })?;

        Ok(Self { name, client, config })
    }
}

#[derive(Serialize)]
struct ExecuteRequest {
    node_name: String,
    state_data: String,
}

#[derive(Deserialize)]
struct ExecuteResponse {
    state_data: String,
    error: Option<String>,
}

#[async_trait]
impl RemoteNodeExecutor for HttpRemoteExecutor {
    async fn execute(&self, node_name: &str, serialized_state: Vec<u8>) -> Result<Vec<u8>, DistributedError> {
        let url = format!("{}/api/v1/nodes/{}/execute", self.config.base_url.trim_end_matches('/'), node_name);
        let request = ExecuteRequest {
            node_name: node_name.to_string(),
            state_data: BASE64.encode(serialized_state),
        };

        let response = self.client.post(&url).json(&request).send().await.map_err(|e| DistributedError::Transport {
            executor: self.name.clone(),
            source: e.to_string(),
        })?;

        let body: ExecuteResponse = response.json().await.map_err(|e| DistributedError::Transport {
            executor: self.name.clone(),
            source: e.to_string(),
        })?;

        if let Some(error) = body.error {
            return Err(DistributedError::RemoteExecutionFailed {
                node: node_name.to_string(),
                executor: self.name.clone(),
                source: error,
            });
        }

        BASE64.decode(body.state_data).map_err(|e| DistributedError::Deserialize(node_name.to_string(), e.to_string()))
    }

    async fn ping(&self) -> Result<(), DistributedError> {
        let url = format!("{}/api/v1/health", self.config.base_url.trim_end_matches('/'));
        let response = self.client.get(&url).send().await.map_err(|e| DistributedError::Transport {
            executor: self.name.clone(),
            source: e.to_string(),
        })?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(DistributedError::Transport {
                executor: self.name.clone(),
                source: format!("health check returned status {}", response.status()),
            })
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
