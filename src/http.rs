use crate::transport::{LogMsg, Transport};
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error;
use urlencoding;

/// Configuration for [`HttpTransport`].
///
/// The transport posts each message as a newline-terminated JSON document to
/// the collector's log ingestion endpoint.
#[derive(Clone, Debug)]
pub struct HttpConfig {
    /// Base URL without query, e.g. "https://collector.example.com"
    pub url: String,
    /// Optional API key, sent as the `X-Api-Key` header.
    pub api_key: Option<String>,
    /// Optional logical application name, sent as a query parameter.
    pub app_name: Option<String>,
}

/// HTTP implementation of [`Transport`] for a remote telemetry collector.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpConfig,
}

impl HttpTransport {
    /// Construct a new transport instance using the provided configuration.
    ///
    /// **Parameters**
    /// - `config`: [`HttpConfig`] describing the collector URL and optional
    ///   authentication settings.
    ///
    /// **Returns**
    /// - A ready-to-use [`HttpTransport`] that can be passed into
    ///   [`init_tracing`](crate::init::init_tracing) /
    ///   [`init_tracing_with_config`](crate::init::init_tracing_with_config).
    pub fn new(config: HttpConfig) -> Self {
        let client = Client::new();
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        let mut url = format!("{}/api/v1/logs", self.config.url.trim_end_matches('/'));
        if let Some(app) = &self.config.app_name {
            url.push_str(&format!("?app={}", urlencoding::encode(app)));
        }
        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn enqueue(&self, msg: &LogMsg) -> Result<(), Box<dyn Error + Send + Sync>> {
        let body = serde_json::to_string(msg)? + "\n";

        let mut request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .body(body);
        if let Some(key) = &self.config.api_key {
            request = request.header("X-Api-Key", key);
        }

        let resp = request.send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(format!("collector ingest failed with status {}: {}", status, text).into())
        }
    }
}
