use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::config::{Config, ResponseContract};
use crate::error::TransportError;

/// The body of a single send.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OutboundQuery {
    pub chat: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<String>>,
}

impl OutboundQuery {
    /// Bytes of user-supplied payload, used for the request-size cap.
    pub fn payload_len(&self) -> usize {
        self.chat.len() + self.file.len()
    }
}

/// Per-record shape discriminator a backend may send alongside the fields.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordShape {
    Maturity,
    Buckets,
}

impl From<RecordShape> for ResponseContract {
    fn from(shape: RecordShape) -> Self {
        match shape {
            RecordShape::Maturity => ResponseContract::Maturity,
            RecordShape::Buckets => ResponseContract::Buckets,
        }
    }
}

/// One element of the backend's answer list. Both backend contracts decode
/// into this; fields the contract doesn't send stay `None`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AnswerRecord {
    #[serde(default)]
    pub shape: Option<RecordShape>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub domain: Option<String>,
    #[serde(default, alias = "maturityLevel", deserialize_with = "scalar_text")]
    pub maturity_level: Option<String>,
    #[serde(default, alias = "nextMaturityLevel", deserialize_with = "scalar_text")]
    pub next_maturity_level: Option<String>,
    #[serde(
        default,
        alias = "response_text",
        alias = "responseText",
        deserialize_with = "scalar_text"
    )]
    pub response: Option<String>,
    #[serde(default)]
    pub answer: Option<serde_json::Value>,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
    #[serde(default, alias = "currentBucket", deserialize_with = "scalar_text")]
    pub current_bucket: Option<String>,
    #[serde(default, alias = "nextBucket", deserialize_with = "scalar_text")]
    pub next_bucket: Option<String>,
}

/// Text fields arrive as whatever the backend's data store holds: numbers and
/// booleans are shown as written, `null` is absent.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct HealthBody {
    message: String,
}

/// Anything that can answer an [`OutboundQuery`].
#[async_trait]
pub trait AdvisoryBackend: Send + Sync {
    async fn query(&self, query: &OutboundQuery) -> Result<Vec<AnswerRecord>, TransportError>;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    query_path: String,
    health_path: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            query_path: config.query_path.clone(),
            health_path: config.health_path.clone(),
        })
    }

    pub fn query_url(&self) -> String {
        format!("{}{}", self.base_url, self.query_path)
    }

    /// Probe the backend's health endpoint.
    pub async fn check(&self) -> Result<String, TransportError> {
        let url = format!("{}{}", self.base_url, self.health_path);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail: extract_detail(&text),
            });
        }

        Ok(serde_json::from_str::<HealthBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text))
    }
}

#[async_trait]
impl AdvisoryBackend for HttpBackend {
    async fn query(&self, query: &OutboundQuery) -> Result<Vec<AnswerRecord>, TransportError> {
        let url = self.query_url();
        tracing::debug!(
            %url,
            chat_bytes = query.chat.len(),
            file_bytes = query.file.len(),
            model = query.model.as_deref().unwrap_or("-"),
            "Posting query"
        );

        let response = self.client.post(&url).json(query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Backend returned an error status");
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail: extract_detail(&text),
            });
        }

        let records: Vec<AnswerRecord> =
            serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))?;
        tracing::debug!(records = records.len(), "Decoded backend response");
        Ok(records)
    }
}

/// Pull a string `detail` out of an error body. Structured details (e.g.
/// validation error lists) are not shown to the user.
fn extract_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| d.as_str().map(str::to_string))
}
