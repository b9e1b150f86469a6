//! Request client for `POST /calculate`
//!
//! One attempt per call: no retries, no timeout. Every failure is normalized
//! into a [`ClientError`] whose `user_message` is what the error panel shows.

use async_trait::async_trait;
use integral_core::{CalculationRequest, CalculationResponse};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result, DEFAULT_CALCULATION_ERROR};

/// Remote calculation collaborator (pluggable for tests)
#[async_trait]
pub trait CalculationService: Send + Sync {
    /// Run one calculation; suspends until the round-trip completes
    async fn calculate(&self, request: &CalculationRequest) -> Result<CalculationResponse>;
}

/// reqwest-backed implementation
pub struct HttpCalculationService {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpCalculationService {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl CalculationService for HttpCalculationService {
    async fn calculate(&self, request: &CalculationRequest) -> Result<CalculationResponse> {
        let url = self.config.calculate_url();
        info!(
            "POST {} (function: {}, definite: {})",
            url,
            request.function,
            request.is_definite()
        );

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("POST {} -> {} ({} bytes)", url, status, body.len());

        interpret_response(status, &body)
    }
}

/// Turn a raw HTTP status and body into a response or an application error
///
/// - non-2xx or `success: false` → [`ClientError::Calculation`] carrying the
///   server's `error` field, or the default message when it is absent
/// - undecodable body → [`ClientError::Decode`] on 2xx, `Calculation` otherwise
pub fn interpret_response(status: u16, body: &str) -> Result<CalculationResponse> {
    let ok_status = (200..300).contains(&status);

    let data: CalculationResponse = match serde_json::from_str(body) {
        Ok(data) => data,
        Err(e) if ok_status => return Err(ClientError::Decode(e)),
        Err(_) => {
            return Err(ClientError::calculation(
                DEFAULT_CALCULATION_ERROR,
                Some(status),
            ))
        }
    };

    if !ok_status || !data.success {
        let message = data
            .error
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CALCULATION_ERROR.to_string());
        return Err(ClientError::calculation(message, Some(status)));
    }

    Ok(data)
}
