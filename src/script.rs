//! The `Scripted` attacker variant: an embedded `rhai` script builds each
//! request (§4.1, §6 script contract).
//!
//! The script is parsed into an `AST` once, at construction time — compiling
//! on every `attack()` call would put a parser in the hot path. Each call
//! gets a fresh `rhai::Scope` so variables set by one invocation's script
//! run never leak into the next (§5 shared-resource policy): the `AST` and
//! the `rhai::Engine` are the only state shared across calls, and both are
//! immutable from the script's point of view.

use std::fs;
use std::time::{Instant as StdInstant, SystemTime};

use rhai::{Dynamic, Engine, Scope, AST};
use tokio_util::sync::CancellationToken;

use crate::attacker::AttackContext;
use crate::errors::{EngineError, ErrorCategory};
use crate::result::AttackResult;

/// Builds and issues one request per call by evaluating a compiled script's
/// `request()` function, which must return a map with at least a `url` key.
pub struct ScriptedAttacker {
    engine: Engine,
    ast: AST,
    client: reqwest::Client,
}

impl ScriptedAttacker {
    /// Load and compile `path`. Any parse failure is fatal pre-run (§7).
    pub fn load(path: &str, client: reqwest::Client) -> Result<Self, EngineError> {
        let source = fs::read_to_string(path).map_err(|source| EngineError::ScriptRead {
            path: path.to_string(),
            source,
        })?;

        let engine = Engine::new();
        let ast = engine
            .compile(&source)
            .map_err(|source| EngineError::ScriptLoad {
                path: path.to_string(),
                source,
            })?;

        Ok(Self { engine, ast, client })
    }

    pub async fn attack(&self, ctx: AttackContext) -> AttackResult {
        let start = SystemTime::now();
        let started_at = StdInstant::now();

        match self.build_request() {
            Ok(built) => self.send(start, started_at, built, ctx.deadline, ctx.cancel).await,
            Err(message) => AttackResult::failure(start, started_at.elapsed(), 0, message),
        }
    }

    /// Evaluate `request()` in a fresh scope and coerce the returned map
    /// into a request description. Any deviation from the contract (missing
    /// `url`, non-map return, evaluation error) is a data error, never a
    /// propagated `Err` — per §6's script contract.
    fn build_request(&self) -> Result<BuiltRequest, String> {
        let mut scope = Scope::new();
        let result: Dynamic = self
            .engine
            .call_fn(&mut scope, &self.ast, "request", ())
            .map_err(|err| format!("{}: {}", ErrorCategory::ScriptError, err))?;

        let map = result
            .try_cast::<rhai::Map>()
            .ok_or_else(|| format!("{}: request() must return a map", ErrorCategory::ScriptError))?;

        let url = map
            .get("url")
            .and_then(|v| v.clone().into_string().ok())
            .ok_or_else(|| format!("{}: request() map missing 'url'", ErrorCategory::ScriptError))?;

        let method = map
            .get("method")
            .and_then(|v| v.clone().into_string().ok())
            .unwrap_or_else(|| "GET".to_string());

        let body = map
            .get("body")
            .and_then(|v| v.clone().into_string().ok());

        let mut headers = Vec::new();
        if let Some(raw_headers) = map.get("headers") {
            if let Some(header_map) = raw_headers.clone().try_cast::<rhai::Map>() {
                for (name, value) in header_map {
                    if let Ok(value) = value.into_string() {
                        headers.push((name.to_string(), value));
                    }
                }
            }
        }

        Ok(BuiltRequest {
            method,
            url,
            body,
            headers,
        })
    }

    async fn send(
        &self,
        start: SystemTime,
        started_at: StdInstant,
        built: BuiltRequest,
        deadline: tokio::time::Instant,
        cancel: CancellationToken,
    ) -> AttackResult {
        let method = match reqwest::Method::from_bytes(built.method.as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                return AttackResult::failure(
                    start,
                    started_at.elapsed(),
                    0,
                    format!("{}: invalid method '{}'", ErrorCategory::ScriptError, built.method),
                )
            }
        };

        let mut request = self.client.request(method, &built.url);
        let mut bytes_out = 0u64;
        if let Some(body) = &built.body {
            bytes_out = body.len() as u64;
            request = request.body(body.clone());
        }
        for (name, value) in &built.headers {
            request = request.header(name, value);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                AttackResult::failure(start, started_at.elapsed(), 0, "cancelled")
            }
            outcome = tokio::time::timeout_at(deadline, request.send()) => {
                crate::attacker::finish_within_deadline(start, started_at, outcome, bytes_out).await
            }
        }
    }
}

struct BuiltRequest {
    method: String,
    url: String,
    body: Option<String>,
    headers: Vec<(String, String)>,
}
