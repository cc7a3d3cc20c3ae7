//! The request-producing abstraction (C3).
//!
//! `Attacker` is a tagged enum rather than a trait object: exactly two
//! variants exist, the dispatch is on the hot path, and neither the pacer
//! nor the workers ever need to match on the variant themselves — only
//! `attack()` does.

use std::time::{Instant as StdInstant, SystemTime};

use tokio_util::sync::CancellationToken;

use crate::client::ClientConfig;
use crate::errors::ErrorCategory;
use crate::result::AttackResult;
use crate::script::ScriptedAttacker;

/// Per-request context handed to `Attacker::attack`.
///
/// `deadline` is this request's own timeout; `cancel` is a child of the
/// run-wide token (§9) so a run-level cancellation reaches in-flight
/// requests without the attacker needing to know about the parent.
pub struct AttackContext {
    pub deadline: tokio::time::Instant,
    pub cancel: CancellationToken,
}

/// One HTTP request producer. `StaticHttp` issues the same method/URL every
/// call; `Scripted` calls into an embedded script to build each request.
pub enum Attacker {
    StaticHttp(StaticHttpAttacker),
    Scripted(ScriptedAttacker),
}

impl Attacker {
    /// Tag used in the presenter header and as a `tracing` field.
    pub fn name(&self) -> &'static str {
        match self {
            Attacker::StaticHttp(_) => "http",
            Attacker::Scripted(_) => "script",
        }
    }

    pub async fn attack(&self, ctx: AttackContext) -> AttackResult {
        match self {
            Attacker::StaticHttp(a) => a.attack(ctx).await,
            Attacker::Scripted(a) => a.attack(ctx).await,
        }
    }
}

/// Issues the same method/URL/body on every call against the shared client.
pub struct StaticHttpAttacker {
    client: reqwest::Client,
    method: reqwest::Method,
    url: String,
    body: Option<Vec<u8>>,
}

impl StaticHttpAttacker {
    pub fn new(client: reqwest::Client, method: reqwest::Method, url: String, body: Option<Vec<u8>>) -> Self {
        Self {
            client,
            method,
            url,
            body,
        }
    }

    /// Convenience constructor that builds its own client from `ClientConfig`.
    pub fn build(
        client_config: &ClientConfig,
        method: reqwest::Method,
        url: String,
        body: Option<Vec<u8>>,
    ) -> Result<Self, reqwest::Error> {
        let client = crate::client::build_client(client_config)?;
        Ok(Self::new(client, method, url, body))
    }

    async fn attack(&self, ctx: AttackContext) -> AttackResult {
        let start = SystemTime::now();
        let started_at = StdInstant::now();

        let mut request = self.client.request(self.method.clone(), &self.url);
        if let Some(body) = &self.body {
            request = request.body(body.clone());
        }
        let bytes_out = self.body.as_ref().map(|b| b.len() as u64).unwrap_or(0);

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                AttackResult::failure(start, started_at.elapsed(), 0, "cancelled")
            }
            outcome = tokio::time::timeout_at(ctx.deadline, request.send()) => {
                finish_within_deadline(start, started_at, outcome, bytes_out).await
            }
        }
    }
}

/// Shared response-handling tail for both attacker variants: unwrap the
/// per-request timeout, fully drain the body (never buffered whole), and
/// classify the outcome.
pub(crate) async fn finish_within_deadline(
    start: SystemTime,
    started_at: StdInstant,
    outcome: Result<Result<reqwest::Response, reqwest::Error>, tokio::time::error::Elapsed>,
    bytes_out: u64,
) -> AttackResult {
    match outcome {
        Err(_) => AttackResult::failure(
            start,
            started_at.elapsed(),
            0,
            ErrorCategory::TimeoutError.to_string(),
        ),
        Ok(response) => finish(start, started_at, response, bytes_out).await,
    }
}

pub(crate) async fn finish(
    start: SystemTime,
    started_at: StdInstant,
    response: Result<reqwest::Response, reqwest::Error>,
    bytes_out: u64,
) -> AttackResult {
    match response {
        Ok(mut resp) => {
            let code = resp.status().as_u16();
            // Stream and discard the body in chunks rather than `resp.bytes()`:
            // buffering it whole accumulates memory at high request rates.
            let mut bytes_in = 0u64;
            loop {
                match resp.chunk().await {
                    Ok(Some(chunk)) => bytes_in += chunk.len() as u64,
                    Ok(None) => break,
                    Err(err) => {
                        let category = ErrorCategory::from_reqwest_error(&err);
                        return AttackResult::failure(start, started_at.elapsed(), code, category.to_string());
                    }
                }
            }

            let latency = started_at.elapsed();
            if let Some(category) = ErrorCategory::from_status_code(code) {
                AttackResult {
                    start,
                    latency,
                    code,
                    bytes_in,
                    bytes_out,
                    error: Some(category.to_string()),
                }
            } else {
                AttackResult::success(start, latency, code, bytes_in, bytes_out)
            }
        }
        Err(err) => {
            let category = ErrorCategory::from_reqwest_error(&err);
            AttackResult::failure(start, started_at.elapsed(), 0, category.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_the_external_interface_tags() {
        let attacker = Attacker::StaticHttp(StaticHttpAttacker::new(
            reqwest::Client::new(),
            reqwest::Method::GET,
            "http://localhost".into(),
            None,
        ));
        assert_eq!(attacker.name(), "http");
    }
}
