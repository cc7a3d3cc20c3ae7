//! Error categories for the engine (§7).
//!
//! `ConfigError` and `EngineError` are real `Result` errors — they stop the
//! process before or outside a run. Per-request failures never surface as a
//! Rust `Err`; they are folded into `AttackResult.error` as data, with
//! `ErrorCategory` used only to build the message and a `tracing` field.

use std::fmt;

use thiserror::Error;

/// Invalid flags, a missing required flag, or a malformed script — surfaced
/// to stderr before `Engine::run` is ever called.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("exactly one of --url or --script must be supplied")]
    MissingTarget,

    #[error("--url and --script are mutually exclusive")]
    ConflictingTarget,

    #[error("--qps must be a positive integer, got {0}")]
    InvalidRate(i64),

    #[error("--workers must be a positive integer, got {0}")]
    InvalidWorkers(i64),

    #[error("invalid URL '{0}': {1}")]
    InvalidUrl(String, String),

    #[error("unsupported HTTP method '{0}'")]
    InvalidMethod(String),
}

/// Reserved for unrecoverable internal faults (§7 `Fatal`): building the
/// shared HTTP client, loading/compiling a script, or initializing the TUI.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("failed to load script '{path}': {source}")]
    ScriptLoad {
        path: String,
        #[source]
        source: rhai::ParseError,
    },

    #[error("failed to read script '{path}': {source}")]
    ScriptRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to initialize terminal UI: {0}")]
    TerminalInit(#[source] std::io::Error),
}

/// Classification of a per-request failure, used to build `AttackResult`'s
/// error message and as a `tracing` field. Purely diagnostic — it plays no
/// part in the success/error bifurcation, which is driven solely by
/// `AttackResult::is_success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// HTTP 4xx errors (client errors)
    ClientError,
    /// HTTP 5xx errors (server errors)
    ServerError,
    /// Network connectivity errors (DNS, connection refused, etc.)
    NetworkError,
    /// Request timeout errors
    TimeoutError,
    /// TLS/SSL certificate errors
    TlsError,
    /// Script produced a malformed request or raised during evaluation
    ScriptError,
    /// Other/unknown errors
    OtherError,
}

impl ErrorCategory {
    /// Categorize an HTTP status code. `None` for success responses.
    pub fn from_status_code(status_code: u16) -> Option<Self> {
        match status_code {
            200..=399 => None,
            400..=499 => Some(ErrorCategory::ClientError),
            500..=599 => Some(ErrorCategory::ServerError),
            _ => Some(ErrorCategory::OtherError),
        }
    }

    /// Categorize a reqwest error encountered while issuing a request.
    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            ErrorCategory::TimeoutError
        } else if error.is_connect() {
            ErrorCategory::NetworkError
        } else if error.is_request() || error.is_body() || error.is_decode() {
            ErrorCategory::NetworkError
        } else {
            let msg = error.to_string().to_lowercase();
            if msg.contains("certificate") || msg.contains("tls") || msg.contains("ssl") {
                ErrorCategory::TlsError
            } else if msg.contains("timeout") {
                ErrorCategory::TimeoutError
            } else if msg.contains("dns") || msg.contains("resolve") || msg.contains("connect") {
                ErrorCategory::NetworkError
            } else {
                ErrorCategory::OtherError
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::ClientError => "client_error",
            ErrorCategory::ServerError => "server_error",
            ErrorCategory::NetworkError => "network_error",
            ErrorCategory::TimeoutError => "timeout_error",
            ErrorCategory::TlsError => "tls_error",
            ErrorCategory::ScriptError => "script_error",
            ErrorCategory::OtherError => "other_error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
