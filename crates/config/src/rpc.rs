// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointProtocol {
    Http,
    Https,
    Ws,
    Wss,
}

impl EndpointProtocol {
    pub fn is_websocket(&self) -> bool {
        matches!(self, EndpointProtocol::Ws | EndpointProtocol::Wss)
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, EndpointProtocol::Https | EndpointProtocol::Wss)
    }
}

/// A validated chain RPC or decryption network URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    protocol: EndpointProtocol,
    url: Url,
}

impl Endpoint {
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).context("Invalid URL format")?;
        let protocol = match parsed.scheme() {
            "http" => EndpointProtocol::Http,
            "https" => EndpointProtocol::Https,
            "ws" => EndpointProtocol::Ws,
            "wss" => EndpointProtocol::Wss,
            _ => bail!("Invalid protocol. Expected: http://, https://, ws://, wss://"),
        };

        if parsed.host_str().is_none() {
            bail!("URL must contain a host");
        }

        Ok(Endpoint {
            protocol,
            url: parsed,
        })
    }

    pub fn protocol(&self) -> EndpointProtocol {
        self.protocol
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Builds the URL of a route below this endpoint, keeping any base path
    pub fn route(&self, path: &str) -> Result<Url> {
        let mut base = self.as_http_url()?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/'))
            .with_context(|| format!("Cannot join '{path}' onto {}", self.url))
    }

    pub fn as_http_url(&self) -> Result<Url> {
        if !self.protocol.is_websocket() {
            return Ok(self.url.clone());
        }
        let mut parsed = self.url.clone();
        let scheme = if self.protocol.is_secure() {
            "https"
        } else {
            "http"
        };
        parsed
            .set_scheme(scheme)
            .map_err(|_| anyhow!("http(s) are valid schemes"))?;
        Ok(parsed)
    }

    pub fn is_local(&self) -> bool {
        match self.hostname() {
            "localhost" | "127.0.0.1" | "::1" | "[::1]" => true,
            host => host.starts_with("127."),
        }
    }
}

#[derive(Debug, Hash, Eq, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(tag = "type", content = "credentials")]
pub enum RpcAuth {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer(String),
}
