//! Network sessions shared between the host and speaker connections

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kef_client::ClientError;
use parking_lot::Mutex;
use tracing::debug;

/// A reusable HTTP session
///
/// Clones share the same underlying connection pool and the same closed flag,
/// so closing any clone closes them all.
#[derive(Debug, Clone)]
pub struct Session {
    http: reqwest::Client,
    closed: Arc<AtomicBool>,
}

impl Session {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Source of sessions, typically the host environment's shared pool
pub trait SessionProvider: Send + Sync {
    /// Hand out a live session
    fn acquire(&self) -> Result<Session, ClientError>;
}

/// Process-wide session pool
///
/// Hands out clones of one session and builds a fresh one only after the
/// current one has been closed.
#[derive(Debug)]
pub struct SharedSessionPool {
    current: Mutex<Option<Session>>,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl SharedSessionPool {
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(5), Duration::from_secs(10))
    }

    pub fn with_timeouts(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            current: Mutex::new(None),
            connect_timeout,
            request_timeout,
        }
    }

    fn build(&self) -> Result<Session, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Session::new(http))
    }
}

impl Default for SharedSessionPool {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider for SharedSessionPool {
    fn acquire(&self) -> Result<Session, ClientError> {
        let mut current = self.current.lock();
        if let Some(session) = current.as_ref().filter(|s| !s.is_closed()) {
            return Ok(session.clone());
        }

        debug!("Creating shared speaker session");
        let session = self.build()?;
        *current = Some(session.clone());
        Ok(session)
    }
}
