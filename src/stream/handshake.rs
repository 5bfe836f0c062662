//! Gateway registration handshake.
//!
//! Before streaming, each device address is resolved to a live stream
//! endpoint by `GET http://{addr}:{port}{path}`; the gateway answers with
//! `{"url": "ws://..."}`.

use serde::Deserialize;

use crate::config::WiretapConfig;
use crate::error::WiretapError;

/// Body of a successful registration response.
#[derive(Debug, Deserialize)]
struct RegisterResponse {
    url: String,
}

/// Resolves device addresses to stream endpoints.
#[derive(Debug, Clone)]
pub struct EndpointHandshake {
    client: reqwest::Client,
    port: u16,
    path: String,
}

impl EndpointHandshake {
    /// Builds a handshake client from the registration settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`WiretapError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &WiretapConfig) -> Result<Self, WiretapError> {
        let client = reqwest::Client::builder()
            .timeout(config.handshake_timeout)
            .build()
            .map_err(|e| WiretapError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            port: config.register_port,
            path: config.register_path.clone(),
        })
    }

    /// Registration URL for `addr`.
    #[must_use]
    pub fn register_url(&self, addr: &str) -> String {
        format!("http://{addr}:{}{}", self.port, self.path)
    }

    /// Registers with the gateway at `addr` and returns the stream endpoint
    /// exactly as the gateway reported it.
    ///
    /// # Errors
    ///
    /// - [`WiretapError::HandshakeUnreachable`] if the request cannot be sent
    ///   or times out.
    /// - [`WiretapError::HandshakeRejected`] on a non-2xx status or a body
    ///   without a string `url` field.
    pub async fn resolve(&self, addr: &str) -> Result<String, WiretapError> {
        let register_url = self.register_url(addr);
        tracing::debug!(%register_url, "registering with gateway");

        let response = self.client.get(&register_url).send().await.map_err(|e| {
            WiretapError::HandshakeUnreachable {
                addr: addr.to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WiretapError::HandshakeRejected {
                addr: addr.to_string(),
                status: Some(status.as_u16()),
                reason: format!("status {status}"),
            });
        }

        let body: RegisterResponse =
            response
                .json()
                .await
                .map_err(|e| WiretapError::HandshakeRejected {
                    addr: addr.to_string(),
                    status: Some(status.as_u16()),
                    reason: format!("unusable registration body: {e}"),
                })?;

        tracing::info!(url = %body.url, "registered with gateway");
        Ok(body.url)
    }
}
