//! Single-flight access-token refresh
//!
//! The first request that needs a new token becomes the leader and performs
//! the refresh. Requests that arrive while it is in flight are parked as
//! followers and released, in arrival order, with the leader's outcome.
//!
//! ```text
//! Idle --join--> Refreshing --settle(Ok)--> Idle
//!                           --settle(Err)-> Idle, generation + 1 (session cleared by the leader)
//! ```
//!
//! Requests record the session generation before sending. A 401 that comes
//! back after its generation ended gets [`Ticket::Ended`] instead of
//! starting a second refresh.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// Result handed to every follower: the new access token, or why it failed
pub type RefreshOutcome = Result<String, String>;

#[derive(Default)]
enum RefreshState {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

/// Tracks whether a refresh is in flight and who is waiting on it
///
/// One coordinator is shared by every clone of a client.
#[derive(Default)]
pub struct RefreshCoordinator {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    state: RefreshState,
    generation: u64,
}

/// Role assigned by [`RefreshCoordinator::join`]
pub enum Ticket {
    /// Perform the refresh and settle the guard
    Leader(LeaderGuard),
    /// Wait for the leader's outcome
    Follower(Waiter),
    /// The session the request was sent in has already been ended
    Ended,
}

/// A parked request waiting for the refresh to settle
pub struct Waiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl Waiter {
    pub async fn wait(self) -> RefreshOutcome {
        self.rx
            .await
            .unwrap_or_else(|_| Err("token refresh was abandoned".to_string()))
    }
}

/// Obligation to settle an in-flight refresh
///
/// Dropping the guard without settling (e.g. the leader's future was
/// cancelled) releases all followers with an error so nobody waits forever.
pub struct LeaderGuard {
    coordinator: Arc<RefreshCoordinator>,
    settled: bool,
}

impl LeaderGuard {
    /// Release all followers with `outcome`, returning how many were waiting
    pub fn settle(mut self, outcome: &RefreshOutcome) -> usize {
        self.settled = true;
        self.coordinator.release(outcome, outcome.is_err())
    }
}

impl Drop for LeaderGuard {
    fn drop(&mut self) {
        if !self.settled {
            let released = self
                .coordinator
                .release(&Err("token refresh was abandoned".to_string()), false);
            warn!(released, "Refresh leader dropped before settling");
        }
    }
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        matches!(self.lock().state, RefreshState::Refreshing { .. })
    }

    /// Number of followers currently parked
    pub fn pending(&self) -> usize {
        match &self.lock().state {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }

    /// Current session generation; bumped each time a failed refresh ends the session
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Become the leader if idle, otherwise queue behind the current refresh
    ///
    /// `generation` is the value read before the failing request was sent.
    pub fn join(self: &Arc<Self>, generation: u64) -> Ticket {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.generation != generation {
            return Ticket::Ended;
        }
        match &mut inner.state {
            RefreshState::Idle => {
                inner.state = RefreshState::Refreshing {
                    waiters: Vec::new(),
                };
                Ticket::Leader(LeaderGuard {
                    coordinator: Arc::clone(self),
                    settled: false,
                })
            }
            RefreshState::Refreshing { waiters } => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Ticket::Follower(Waiter { rx })
            }
        }
    }

    /// Queue behind the current refresh, or `None` when idle
    pub fn wait_if_refreshing(&self) -> Option<Waiter> {
        let mut inner = self.lock();
        match &mut inner.state {
            RefreshState::Idle => None,
            RefreshState::Refreshing { waiters } => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Some(Waiter { rx })
            }
        }
    }

    fn release(&self, outcome: &RefreshOutcome, ends_session: bool) -> usize {
        let waiters = {
            let mut inner = self.lock();
            if ends_session {
                inner.generation += 1;
            }
            match std::mem::take(&mut inner.state) {
                RefreshState::Idle => Vec::new(),
                RefreshState::Refreshing { waiters } => waiters,
            }
        };
        let count = waiters.len();
        for waiter in waiters {
            // A dropped receiver means that caller gave up; nothing to do.
            let _ = waiter.send(outcome.clone());
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(ticket: Ticket) -> LeaderGuard {
        match ticket {
            Ticket::Leader(guard) => guard,
            _ => panic!("expected leader"),
        }
    }

    fn follower(ticket: Ticket) -> Waiter {
        match ticket {
            Ticket::Follower(waiter) => waiter,
            _ => panic!("expected follower"),
        }
    }

    #[tokio::test]
    async fn test_first_join_leads_others_follow() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let guard = leader(coordinator.join(0));
        let a = follower(coordinator.join(0));
        let b = follower(coordinator.join(0));
        assert!(coordinator.is_refreshing());
        assert_eq!(coordinator.pending(), 2);

        assert_eq!(guard.settle(&Ok("fresh".into())), 2);
        assert!(!coordinator.is_refreshing());

        assert_eq!(a.wait().await, Ok("fresh".to_string()));
        assert_eq!(b.wait().await, Ok("fresh".to_string()));
    }

    #[tokio::test]
    async fn test_failure_reaches_every_follower() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let guard = leader(coordinator.join(0));
        let waiters: Vec<_> = (0..3).map(|_| follower(coordinator.join(0))).collect();

        guard.settle(&Err("refresh token expired".into()));

        for waiter in waiters {
            assert_eq!(waiter.wait().await, Err("refresh token expired".to_string()));
        }
    }

    #[tokio::test]
    async fn test_dropped_leader_releases_followers() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let guard = leader(coordinator.join(0));
        let waiter = follower(coordinator.join(0));

        drop(guard);

        assert!(waiter.wait().await.is_err());
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_idle_after_settle_allows_new_leader() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        leader(coordinator.join(0)).settle(&Ok("t1".into()));
        assert!(coordinator.wait_if_refreshing().is_none());
        assert_eq!(coordinator.generation(), 0);
        let _second = leader(coordinator.join(0));
        assert!(coordinator.wait_if_refreshing().is_some());
    }

    #[tokio::test]
    async fn test_failed_refresh_ends_generation() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        leader(coordinator.join(0)).settle(&Err("refresh token expired".into()));
        assert_eq!(coordinator.generation(), 1);

        // A 401 from a request sent before the failure does not lead again
        assert!(matches!(coordinator.join(0), Ticket::Ended));
        assert!(!coordinator.is_refreshing());

        // Requests sent afterwards belong to the new generation
        let _guard = leader(coordinator.join(1));
    }

    #[tokio::test]
    async fn test_abandoned_refresh_keeps_generation() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        drop(leader(coordinator.join(0)));
        assert_eq!(coordinator.generation(), 0);
    }
}
