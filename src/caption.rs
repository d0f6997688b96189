//! Image captioning client.
//!
//! Speaks the Vertex AI `imagetext` predict shape: base64 image in, list of
//! caption strings out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bot::collaborators::Captioner;
use crate::bot::error::CollaboratorError;

pub struct CaptionClient {
    endpoint: Option<String>,
    token: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: Vec<Instance<'a>>,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Instance<'a> {
    image: ImageData<'a>,
}

#[derive(Serialize)]
struct ImageData<'a> {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64_encoded: &'a str,
}

#[derive(Serialize)]
struct Parameters {
    #[serde(rename = "sampleCount")]
    sample_count: u32,
    language: &'static str,
}

#[derive(Deserialize, Debug)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<String>,
}

impl CaptionClient {
    pub fn new(endpoint: Option<String>, token: Option<String>) -> Self {
        Self {
            endpoint,
            token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Captioner for CaptionClient {
    async fn describe(&self, image_base64: &str) -> Result<Vec<String>, CollaboratorError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| CollaboratorError::Unavailable("no captioning endpoint configured".to_string()))?;

        let request = PredictRequest {
            instances: vec![Instance {
                image: ImageData {
                    bytes_base64_encoded: image_base64,
                },
            }],
            parameters: Parameters {
                sample_count: 1,
                language: "en",
            },
        };

        let mut builder = self.client.post(endpoint).json(&request);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CollaboratorError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CollaboratorError::Http(format!("Failed to read response: {e}")))?;

        debug!("Caption response status: {status}");

        if !status.is_success() {
            return Err(CollaboratorError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PredictResponse =
            serde_json::from_str(&body).map_err(|e| CollaboratorError::Parse(e.to_string()))?;

        if parsed.predictions.is_empty() {
            return Err(CollaboratorError::Empty);
        }
        Ok(parsed.predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_is_unavailable() {
        let client = CaptionClient::new(None, None);
        let err = client.describe("aGVsbG8=").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Unavailable(_)));
    }

    #[test]
    fn test_request_shape() {
        let request = PredictRequest {
            instances: vec![Instance {
                image: ImageData {
                    bytes_base64_encoded: "aGVsbG8=",
                },
            }],
            parameters: Parameters {
                sample_count: 1,
                language: "en",
            },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "instances": [{"image": {"bytesBase64Encoded": "aGVsbG8="}}],
                "parameters": {"sampleCount": 1, "language": "en"}
            })
        );
    }

    #[test]
    fn test_parse_predictions() {
        let parsed: PredictResponse =
            serde_json::from_str(r#"{"predictions":["a fox sitting in the snow","a fox"]}"#).unwrap();
        assert_eq!(parsed.predictions[0], "a fox sitting in the snow");

        let parsed: PredictResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.predictions.is_empty());
    }
}
