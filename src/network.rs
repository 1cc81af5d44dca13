// file: src/network.rs
// description: HTTP client construction with explicit proxy settings read once at startup
// reference: https://docs.rs/reqwest

use crate::config::NetworkConfig;
use crate::error::{ChatError, Result};
use reqwest::{Client, NoProxy, Proxy};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Every remote call in the crate goes through a client built here, so the
/// configured proxies and timeout apply uniformly.
pub fn build_http_client(network: &NetworkConfig, timeout: Duration) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(30)));

    if let Some(url) = &network.http_proxy {
        debug!("Using HTTP proxy {}", url);
        let proxy = Proxy::http(url)
            .map_err(|e| ChatError::Config(format!("Invalid http_proxy {}: {}", url, e)))?;
        builder = builder.proxy(proxy.no_proxy(no_proxy(network)));
    }

    if let Some(url) = &network.https_proxy {
        debug!("Using HTTPS proxy {}", url);
        let proxy = Proxy::https(url)
            .map_err(|e| ChatError::Config(format!("Invalid https_proxy {}: {}", url, e)))?;
        builder = builder.proxy(proxy.no_proxy(no_proxy(network)));
    }

    builder
        .build()
        .map_err(|e| ChatError::Config(format!("Failed to build HTTP client: {}", e)))
}

fn no_proxy(network: &NetworkConfig) -> Option<NoProxy> {
    network.no_proxy.as_deref().and_then(NoProxy::from_string)
}

/// Accepts connections and never answers, so requests against it run into
/// the client timeout.
#[cfg(test)]
pub(crate) async fn silent_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });
    format!("http://{}/v1", addr)
}
