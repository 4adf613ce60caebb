//! Cancellation signals
//!
//! Both signals are level-triggered: once set they stay set, so an agent
//! that checks late still observes them. Waiters are woken through a
//! `tokio::sync::Notify`, so nobody busy-polls the flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct SignalInner {
    set: AtomicBool,
    notify: Notify,
}

/// One-shot stop flag, cheap to clone and share
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<SignalInner>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and wake every waiter.
    ///
    /// Returns true only for the call that actually raised it.
    pub fn set(&self) -> bool {
        let first = !self.inner.set.swap(true, Ordering::SeqCst);
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.inner.set.load(Ordering::SeqCst)
    }

    /// Resolve once the flag is raised (immediately if it already is)
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent set() cannot be missed
            notified.as_mut().enable();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

/// Lab-wide permission for agents to keep running
///
/// Granted at creation, revoked exactly once at experiment end.
#[derive(Debug, Clone, Default)]
pub struct Authorization {
    revoked: StopSignal,
}

impl Authorization {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_granted(&self) -> bool {
        !self.revoked.is_set()
    }

    /// Revoke the authorization; returns true only on the first call
    pub fn revoke(&self) -> bool {
        self.revoked.set()
    }

    /// Resolve once the authorization has been revoked
    pub async fn revoked(&self) {
        self.revoked.wait().await
    }
}
