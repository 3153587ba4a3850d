//! Connectivity probes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Checks whether the network path shared by all sources is usable.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Probe that sends a HEAD request to a fixed URL.
///
/// Any response, whatever its status, counts as reachable.
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn is_reachable(&self) -> bool {
        match self.client.head(&self.url).send().await {
            Ok(response) => {
                debug!(url = %self.url, status = %response.status(), "Connectivity probe answered");
                true
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "Connectivity probe failed");
                false
            }
        }
    }
}

/// Probe for deployments that do not check connectivity.
pub struct AlwaysOnline;

#[async_trait]
impl ConnectivityProbe for AlwaysOnline {
    async fn is_reachable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_online() {
        assert!(tokio_test::block_on(AlwaysOnline.is_reachable()));
    }

    #[tokio::test]
    async fn test_http_probe_unreachable_host() {
        // Port 1 on localhost is closed on any sane test machine.
        let probe = HttpProbe::new("http://127.0.0.1:1/", Duration::from_secs(2)).unwrap();
        assert!(!probe.is_reachable().await);
    }
}
