use std::time::Duration;

use async_trait::async_trait;

use crate::detection::response::parse_detection_response;
use crate::detection::types::DetectionResponse;
use crate::errors::{LensError, LensResult, NetworkError};
use crate::upload::request::{read_payload_bytes, MultipartPayload};

/// Detection servers always listen here; not user-configurable.
pub const DETECTION_PORT: u16 = 8000;
pub const DETECTION_PATH: &str = "/detect";
pub const DETECTION_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Anything that can turn an uploaded image into detections.
#[async_trait]
pub trait DetectionService: Send + Sync {
    async fn submit_detection(
        &self,
        host: &str,
        payload: &MultipartPayload,
    ) -> LensResult<DetectionResponse>;
}

/// `host:port` as shown to the user in error messages.
pub fn endpoint_label(host: &str) -> String {
    format!("{}:{}", host.trim(), DETECTION_PORT)
}

/// Plain-HTTP multipart client for `POST http://{host}:8000/detect`.
pub struct HttpDetectionClient {
    client: reqwest::Client,
    port: u16,
}

impl HttpDetectionClient {
    pub fn new() -> LensResult<Self> {
        Self::build(DETECTION_PORT)
    }

    fn build(port: u16) -> LensResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(DETECTION_TIMEOUT)
            .build()?;
        Ok(Self { client, port })
    }

    pub fn detection_url(&self, host: &str) -> String {
        format!("http://{}:{}{}", host.trim(), self.port, DETECTION_PATH)
    }

    fn endpoint(&self, host: &str) -> String {
        format!("{}:{}", host.trim(), self.port)
    }
}

#[async_trait]
impl DetectionService for HttpDetectionClient {
    async fn submit_detection(
        &self,
        host: &str,
        payload: &MultipartPayload,
    ) -> LensResult<DetectionResponse> {
        if host.trim().is_empty() {
            return Err(LensError::MissingEndpoint);
        }
        let endpoint = self.endpoint(host);
        let url = self.detection_url(host);
        let request_id = uuid::Uuid::new_v4();

        let setup_err = |reason: String| NetworkError::RequestSetup {
            endpoint: endpoint.clone(),
            reason,
        };

        let bytes = read_payload_bytes(payload)
            .await
            .map_err(|e| setup_err(format!("could not read image: {e}")))?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(payload.filename.clone())
            .mime_str(payload.content_type)
            .map_err(|e| setup_err(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part(payload.field_name, part);

        tracing::info!(
            %request_id,
            url = %url,
            filename = %payload.filename,
            "submitting detection request"
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_send_error(&endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%request_id, status = status.as_u16(), "detection server returned error");
            return Err(NetworkError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body = response.text().await.map_err(|e| NetworkError::NoResponse {
            endpoint: endpoint.clone(),
            reason: format!("reading body: {e}"),
        })?;

        let parsed = parse_detection_response(&body)?;
        tracing::info!(%request_id, count = parsed.detections.len(), "detection response received");
        Ok(parsed)
    }
}

/// Builder failures never left the device; everything else (connect,
/// timeout, reset) means the request went out without a usable reply.
fn classify_send_error(endpoint: &str, e: reqwest::Error) -> LensError {
    let endpoint = endpoint.to_string();
    let err = if e.is_builder() {
        NetworkError::RequestSetup {
            endpoint,
            reason: e.to_string(),
        }
    } else if e.is_timeout() {
        NetworkError::NoResponse {
            endpoint,
            reason: format!("timed out after {} ms", DETECTION_TIMEOUT.as_millis()),
        }
    } else {
        NetworkError::NoResponse {
            endpoint,
            reason: e.to_string(),
        }
    };
    tracing::warn!(error = %err, "detection request failed");
    err.into()
}
