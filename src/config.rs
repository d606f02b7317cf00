use bytes::Bytes;
use std::time::Duration;

pub const DEFAULT_RETRIES: u8 = 10;
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_SESSIONS: usize = 64;

/// Server-wide policy. The payload is shared read-only by every session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bytes served for every read request.
    pub payload: Bytes,
    /// Send attempts per block before the session gives up. Zero means the default.
    pub retries: u8,
    /// How long to wait for an acknowledgment. Zero means the default.
    pub ack_timeout: Duration,
    /// Concurrently active sessions. Requests beyond the cap are dropped.
    /// Zero means the default.
    pub max_sessions: usize,
}

impl Config {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            retries: DEFAULT_RETRIES,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}
