//! The immutable outcome of a single attempted request (C1).
//!
//! An `AttackResult` is produced exactly once per `Attacker::attack` call and
//! is never mutated afterwards; it is committed to `Stats` and, optionally,
//! read by the presenter.

use std::time::{Duration, SystemTime};

/// Immutable outcome of one attempted request.
///
/// Exactly one of "success" or "error" holds for any `AttackResult`: success
/// means `error` is `None` and `code` falls in `200..400`. Everything else —
/// transport failures, timeouts, non-2xx/3xx status, malformed script output
/// — is an error, with `code` left at `0` unless bytes were actually read off
/// the wire before the failure.
#[derive(Debug, Clone)]
pub struct AttackResult {
    /// Wall-clock time the request was issued. Monotonic ordering isn't
    /// required for aggregation, but start time is reported alongside
    /// latency for external consumers (e.g. a future report generator).
    pub start: SystemTime,

    /// How long the attempt took, from issue to final outcome (success,
    /// transport error, or timeout).
    pub latency: Duration,

    /// HTTP status code, or `0` if no response was obtained.
    pub code: u16,

    /// Bytes read from the response body (fully drained, never buffered).
    pub bytes_in: u64,

    /// Bytes written in the request body. `0` when unknown or absent.
    pub bytes_out: u64,

    /// Absent on success; a short classified message otherwise.
    pub error: Option<String>,
}

impl AttackResult {
    /// The success predicate from the data model: no error *and* a status
    /// in `200..400`. The code range is authoritative even when `error` is
    /// `Some("")` — an empty error string does not count as success.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..400).contains(&self.code)
    }

    /// Convenience constructor for a successful attempt.
    pub fn success(start: SystemTime, latency: Duration, code: u16, bytes_in: u64, bytes_out: u64) -> Self {
        Self {
            start,
            latency,
            code,
            bytes_in,
            bytes_out,
            error: None,
        }
    }

    /// Convenience constructor for a failed attempt. `code` is `0` unless
    /// the caller actually read a status/bytes before the failure occurred.
    pub fn failure(start: SystemTime, latency: Duration, code: u16, message: impl Into<String>) -> Self {
        Self {
            start,
            latency,
            code,
            bytes_in: 0,
            bytes_out: 0,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_requires_no_error_and_2xx_3xx() {
        let r = AttackResult::success(SystemTime::now(), Duration::from_millis(5), 200, 128, 0);
        assert!(r.is_success());

        let r = AttackResult::success(SystemTime::now(), Duration::from_millis(5), 399, 128, 0);
        assert!(r.is_success());
    }

    #[test]
    fn non_2xx_3xx_without_error_is_still_an_error() {
        // §9(a): a response with no transport error but a non-2xx/3xx code
        // is classified as an error — the code range is authoritative.
        let r = AttackResult {
            start: SystemTime::now(),
            latency: Duration::from_millis(5),
            code: 500,
            bytes_in: 10,
            bytes_out: 0,
            error: None,
        };
        assert!(!r.is_success());
    }

    #[test]
    fn explicit_error_is_never_success() {
        let r = AttackResult::failure(SystemTime::now(), Duration::from_millis(5), 0, "connect refused");
        assert!(!r.is_success());
    }

    #[test]
    fn empty_error_string_is_still_an_error() {
        let r = AttackResult::failure(SystemTime::now(), Duration::from_millis(1), 500, "");
        assert!(!r.is_success());
    }
}
