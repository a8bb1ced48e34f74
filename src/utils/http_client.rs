use reqwest::{redirect, Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;

fn base_builder(user_agent: &str, timeout: Duration) -> ClientBuilder {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout)
}

/// Build the shared reqwest client used for fetches and probes
///
/// Every request carries the configured user-agent. `timeout` bounds the
/// whole request; individual probes may tighten it per request.
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    debug!("Creating HTTP client (timeout: {:?})", timeout);
    base_builder(user_agent, timeout).build()
}

/// Same as [`build_http_client`] but a redirect is returned as the response
pub fn build_non_redirecting_client(
    user_agent: &str,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    debug!("Creating non-redirecting HTTP client (timeout: {:?})", timeout);
    base_builder(user_agent, timeout)
        .redirect(redirect::Policy::none())
        .build()
}
