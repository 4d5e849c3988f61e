use std::fmt;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Connection lifecycle state of a transport.
///
/// `Connecting` is a transient sub-state internal to a connect attempt; a
/// connect operation always terminates in `Connected` or `Failed` before
/// returning, so `Connecting` is never observable between calls.
pub enum TransportStatus {
    /// No session is held. The initial state, and the state after `disconnect`.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// A session is held and the transport may send and receive.
    Connected,
    /// The last connect attempt failed; a later attempt may still succeed.
    Failed,
}

impl TransportStatus {
    /// Returns `true` if a connect attempt may be started from this state.
    pub fn can_connect(self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed)
    }
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
/// Guarded [`TransportStatus`] owned by one transport instance.
///
/// Reads are safe from any thread; the state changes only through the
/// transition methods below, never through a bare flag.
pub struct StatusCell {
    inner: Mutex<TransportStatus>,
}

impl StatusCell {
    /// Create a cell in the `Disconnected` state.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TransportStatus::Disconnected),
        }
    }

    /// Current state.
    pub fn load(&self) -> TransportStatus {
        *self.lock()
    }

    /// Enter `Connecting` if a connect attempt is allowed.
    ///
    /// Returns the current state unchanged when the attempt is not allowed
    /// (already `Connected` or `Connecting`).
    pub fn begin_connect(&self) -> Result<(), TransportStatus> {
        let mut guard = self.lock();
        if !guard.can_connect() {
            return Err(*guard);
        }
        *guard = TransportStatus::Connecting;
        Ok(())
    }

    /// Leave `Connecting` for a terminal state.
    pub fn finish_connect(&self, success: bool) {
        *self.lock() = if success {
            TransportStatus::Connected
        } else {
            TransportStatus::Failed
        };
    }

    /// Enter `Disconnected` regardless of the prior state.
    pub fn disconnect(&self) {
        *self.lock() = TransportStatus::Disconnected;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TransportStatus> {
        // No transition can panic while holding the guard; a poisoned
        // mutex still carries a consistent state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}
