// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptionNetwork, DisclosureRequest, DisclosureResponse, NetworkError};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use cv_config::{ChainConfig, DisclosureConfig, Endpoint, RpcAuth};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

/// Route a decryption network serves disclosures on
pub const DISCLOSE_ROUTE: &str = "v1/disclose";

/// Body of every non 2xx response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Client for a decryption network reachable over HTTP
#[derive(Clone, Debug)]
pub struct HttpDecryptionNetwork {
    client: reqwest::Client,
    url: Url,
    auth: RpcAuth,
}

impl HttpDecryptionNetwork {
    pub fn new(endpoint: &Endpoint, auth: RpcAuth, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Could not build HTTP client")?;
        Ok(Self {
            client,
            url: endpoint.route(DISCLOSE_ROUTE)?,
            auth,
        })
    }

    /// Client for the network serving the given chain
    pub fn from_chain(chain: &ChainConfig, disclosure: &DisclosureConfig) -> Result<Self> {
        Self::new(
            &chain.kms_endpoint()?,
            chain.rpc_auth.clone(),
            disclosure.request_timeout(),
        )
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

fn status_error(status: StatusCode, message: String, request: &DisclosureRequest) -> NetworkError {
    match status.as_u16() {
        401 | 403 => NetworkError::Denied(message),
        409 => NetworkError::ContextMismatch(message),
        // 425 Too Early
        404 | 425 => NetworkError::NotReady(request.handle),
        422 => NetworkError::Malformed(message),
        _ => NetworkError::Unavailable(format!("HTTP {status}: {message}")),
    }
}

#[async_trait]
impl DecryptionNetwork for HttpDecryptionNetwork {
    async fn disclose(
        &self,
        request: DisclosureRequest,
    ) -> Result<DisclosureResponse, NetworkError> {
        trace!(url = %self.url, correlation_id = request.correlation_id, "POST disclosure");
        let mut builder = self.client.post(self.url.clone()).json(&request);
        builder = match &self.auth {
            RpcAuth::None => builder,
            RpcAuth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            RpcAuth::Bearer(token) => builder.bearer_auth(token),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| NetworkError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or_default().to_string(),
            };
            debug!(%status, correlation_id = request.correlation_id, "disclosure refused: {message}");
            return Err(status_error(status, message, &request));
        }

        response
            .json::<DisclosureResponse>()
            .await
            .map_err(|e| NetworkError::Malformed(e.to_string()))
    }
}
