//! Cancellation context for handshakes
//!
//! A [`Context`] carries a cancellation signal and an optional deadline down
//! to [`TlsConn::handshake`](crate::tls::TlsConn::handshake). The stubs never
//! look at it themselves; they hand it to the configured callback, which may
//! honour it or not. Real engines check it before doing any I/O.
//!
//! Cancellation is built on [`tokio_util::sync::CancellationToken`], which
//! works without a runtime: cancelling a parent cancels every context derived
//! from it.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Why a context is done
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation context
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never canceled and has no deadline
    pub fn background() -> Self {
        Context {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Derive a child context that can be canceled through the returned handle
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        let token = self.token.child_token();
        let ctx = Context {
            token: token.clone(),
            deadline: self.deadline,
        };
        (ctx, CancelHandle { token })
    }

    /// Derive a child context that expires at `deadline`
    ///
    /// The child never outlives its parent: if the parent already has an
    /// earlier deadline, that one is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Context {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Context {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child context that expires after `timeout`
    pub fn with_timeout(&self, timeout: Duration) -> Context {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => Context {
                token: self.token.child_token(),
                deadline: self.deadline,
            },
        }
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is still live
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Whether the context was canceled or its deadline passed
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::background()
    }
}

/// Cancels the context returned alongside it by [`Context::with_cancel`]
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Cancel the context and everything derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }
}
