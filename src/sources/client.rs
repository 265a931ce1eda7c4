//! Shared outbound HTTP client.

use reqwest::Client;
use std::time::Duration;

use super::UpstreamError;

/// Build the pooled client used by every source.
pub fn build_client(timeout: Duration) -> Result<Client, UpstreamError> {
    let client = Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .user_agent(concat!("river-tracker/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// GET `url` and return the body; any non-success status is an error.
pub(crate) async fn get_body(client: &Client, url: &str) -> Result<String, UpstreamError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url = %url, status = status.as_u16(), "Upstream fetch failed");
        return Err(UpstreamError::Status(status.as_u16()));
    }
    Ok(response.text().await?)
}
