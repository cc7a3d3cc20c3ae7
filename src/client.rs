//! Shared HTTP client construction for the StaticHTTP attacker (§4.1).

use crate::connection_pool::PoolConfig;

/// Configuration for building the shared `reqwest::Client`.
pub struct ClientConfig {
    /// `--insecure`: skip TLS certificate and hostname verification.
    pub skip_tls_verify: bool,
    pub pool_config: PoolConfig,
}

/// Builds the single `reqwest::Client` shared by every StaticHTTP worker.
///
/// One client per run, reused across all requests, so connection pooling
/// actually pools — per §4.1 and the pool defaults in `connection_pool`.
pub fn build_client(config: &ClientConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder();
    builder = config.pool_config.apply_to_builder(builder);

    if config.skip_tls_verify {
        builder = builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    builder.build()
}
