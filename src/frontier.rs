//! Deduplicated work queue shared by all crawl workers.
//!
//! Three collections move in lockstep under one mutex: `frontier` is the
//! FIFO of URLs to process, `queued` mirrors its membership, and `visited`
//! holds every URL a worker has ever claimed. A URL moves from queued to
//! visited in the same critical section that pops it, so two workers can
//! never claim the same URL and a re-offered URL is rejected while it is
//! still being processed.
//!
//! The in-flight worker count lives in the same critical section: a claim
//! that empties the queue and the idle check that decides whether the crawl
//! is finished must observe a consistent pair (queue empty, nobody busy),
//! otherwise a worker could declare quiescence while another is about to
//! enqueue the links it just extracted.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::url_utils;

/// How long an idle worker waits before re-checking the queue. The `Notify`
/// wakeup makes this a fallback, not the steady-state latency.
const IDLE_RECHECK: Duration = Duration::from_millis(50);

/// Outcome of a claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The caller now owns this URL and must call [`FrontierSet::release`]
    /// exactly once when done with it.
    Url(String),
    /// Queue empty but other workers are still busy and may enqueue more.
    Idle,
    /// Queue empty and no worker busy: the crawl is complete.
    Quiescent,
}

#[derive(Default)]
struct Inner {
    frontier: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    in_flight: usize,
}

#[derive(Default)]
pub struct FrontierSet {
    inner: Mutex<Inner>,
    work_available: Notify,
}

impl FrontierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a candidate URL, already domain/extension filtered by the
    /// caller. Returns true when it was accepted into the queue.
    pub fn offer(&self, url: &str) -> bool {
        let normalized = url_utils::strip_fragment(url);
        if normalized.is_empty() {
            return false;
        }

        let mut inner = self.inner.lock();
        if inner.visited.contains(normalized) || inner.queued.contains(normalized) {
            return false;
        }
        inner.queued.insert(normalized.to_string());
        inner.frontier.push_back(normalized.to_string());
        drop(inner);

        self.work_available.notify_one();
        true
    }

    /// Pop the next URL and mark it visited, or report the queue state.
    pub fn try_claim(&self) -> Claim {
        let mut inner = self.inner.lock();
        match inner.frontier.pop_front() {
            Some(url) => {
                inner.queued.remove(&url);
                inner.visited.insert(url.clone());
                inner.in_flight += 1;
                Claim::Url(url)
            }
            None if inner.in_flight == 0 => Claim::Quiescent,
            None => Claim::Idle,
        }
    }

    /// Balance a successful claim once the URL is fully processed, including
    /// any links offered back into the queue.
    pub fn release(&self) {
        let mut inner = self.inner.lock();
        debug_assert!(inner.in_flight > 0, "release without a matching claim");
        inner.in_flight -= 1;
        let quiescent = inner.in_flight == 0 && inner.frontier.is_empty();
        drop(inner);

        if quiescent {
            // Wake every idle worker so each can observe quiescence and exit.
            self.work_available.notify_waiters();
        }
    }

    /// Park until new work may be available, bounded by [`IDLE_RECHECK`].
    pub async fn wait_for_work(&self) {
        let _ = tokio::time::timeout(IDLE_RECHECK, self.work_available.notified()).await;
    }

    /// Wake every parked worker, e.g. after the stop flag flips.
    pub fn wake_all(&self) {
        self.work_available.notify_waiters();
    }

    /// Number of URLs waiting in the queue.
    pub fn len(&self) -> usize {
        self.inner.lock().frontier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of URLs ever claimed.
    pub fn visited_count(&self) -> usize {
        self.inner.lock().visited.len()
    }
}
