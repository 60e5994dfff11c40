// =============================================================================
// Admission Gate - per-caller minimum request interval
// =============================================================================
//
// A window-of-one limiter: each caller gets at most one admitted request per
// `interval`. There is no burst allowance and no queue; a rejected call is
// dropped and the caller's entry is left untouched, so hammering the gate does
// not extend the wait.
//
// The whole table sits behind one mutex. The lookup, the interval check and
// the timestamp update for a caller happen under a single acquisition, so two
// simultaneous requests from the same caller can never both be admitted.
//
// Entries older than `retention` are dropped by `sweep`, which the service
// runs on a timer. An entry that old can never cause a rejection, so sweeping
// does not change any admission outcome.
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::types::CallerId;

/// Minimum spacing between two admitted requests from the same caller.
pub const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(1500);

/// How many intervals an idle entry survives before `sweep` removes it.
const DEFAULT_RETENTION_MULTIPLIER: u32 = 40;

/// Thread-safe per-caller admission gate.
pub struct AdmissionGate {
    last_accepted: Mutex<HashMap<CallerId, Instant>>,
    interval: Duration,
    retention: Duration,
    admitted_total: AtomicU64,
    rejected_total: AtomicU64,
}

/// Serialisable view of the gate for the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSnapshot {
    pub interval_ms: u64,
    pub tracked_callers: usize,
    pub admitted_total: u64,
    pub rejected_total: u64,
}

impl AdmissionGate {
    /// Gate with the given interval and the default retention.
    pub fn new(interval: Duration) -> Self {
        Self::with_retention(interval, interval * DEFAULT_RETENTION_MULTIPLIER)
    }

    /// Gate with an explicit retention. Retention is never shorter than the
    /// interval.
    pub fn with_retention(interval: Duration, retention: Duration) -> Self {
        Self {
            last_accepted: Mutex::new(HashMap::new()),
            interval,
            retention: retention.max(interval),
            admitted_total: AtomicU64::new(0),
            rejected_total: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    // -------------------------------------------------------------------------
    // Admission
    // -------------------------------------------------------------------------

    /// Admit or reject a request from `caller` arriving at `now`.
    ///
    /// The caller's timestamp is only updated on admission.
    pub fn try_admit(&self, caller: &CallerId, now: Instant) -> bool {
        let outcome = {
            let mut table = self.last_accepted.lock();
            match table.get_mut(caller) {
                Some(last) => {
                    let elapsed = now.saturating_duration_since(*last);
                    if elapsed < self.interval {
                        Err(elapsed)
                    } else {
                        *last = now;
                        Ok(())
                    }
                }
                None => {
                    table.insert(caller.clone(), now);
                    Ok(())
                }
            }
        };

        match outcome {
            Ok(()) => {
                self.admitted_total.fetch_add(1, Ordering::Relaxed);
                trace!(caller = %caller, "request admitted");
                true
            }
            Err(elapsed) => {
                self.rejected_total.fetch_add(1, Ordering::Relaxed);
                debug!(
                    caller = %caller,
                    elapsed_ms = elapsed.as_millis() as u64,
                    retry_in_ms = (self.interval - elapsed).as_millis() as u64,
                    "request rejected by admission gate"
                );
                false
            }
        }
    }

    /// `try_admit` against the monotonic clock.
    pub fn try_admit_now(&self, caller: &CallerId) -> bool {
        self.try_admit(caller, Instant::now())
    }

    // -------------------------------------------------------------------------
    // Eviction
    // -------------------------------------------------------------------------

    /// Drop every entry idle for at least `retention`. Returns how many were
    /// removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut table = self.last_accepted.lock();
        let before = table.len();
        let retention = self.retention;
        table.retain(|_, last| now.saturating_duration_since(*last) < retention);
        let removed = before - table.len();
        drop(table);

        if removed > 0 {
            debug!(removed, retention_secs = retention.as_secs_f64(), "admission gate swept");
        }
        removed
    }

    // -------------------------------------------------------------------------
    // Snapshot
    // -------------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.last_accepted.lock().len()
    }

    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            interval_ms: self.interval.as_millis() as u64,
            tracked_callers: self.len(),
            admitted_total: self.admitted_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
        }
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new(RATE_LIMIT_INTERVAL)
    }
}

impl std::fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("interval", &self.interval)
            .field("retention", &self.retention)
            .field("tracked_callers", &self.len())
            .field("admitted_total", &self.admitted_total.load(Ordering::Relaxed))
            .field("rejected_total", &self.rejected_total.load(Ordering::Relaxed))
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn first_request_admitted() {
        let gate = AdmissionGate::default();
        assert!(gate.try_admit(&"alice".into(), Instant::now()));
        assert_eq!(gate.len(), 1);
    }

    #[test]
    fn second_request_inside_interval_rejected() {
        let gate = AdmissionGate::default();
        let caller = CallerId::new("alice");
        let t0 = Instant::now();
        assert!(gate.try_admit(&caller, t0));
        assert!(!gate.try_admit(&caller, t0 + ms(500)));
        assert!(gate.try_admit(&caller, t0 + ms(1600)));
    }

    #[test]
    fn exactly_one_interval_later_is_admitted() {
        let gate = AdmissionGate::default();
        let caller = CallerId::new("bob");
        let t0 = Instant::now();
        assert!(gate.try_admit(&caller, t0));
        assert!(gate.try_admit(&caller, t0 + RATE_LIMIT_INTERVAL));
    }

    #[test]
    fn rejection_does_not_refresh_entry() {
        let gate = AdmissionGate::default();
        let caller = CallerId::new("carol");
        let t0 = Instant::now();
        assert!(gate.try_admit(&caller, t0));
        assert!(!gate.try_admit(&caller, t0 + ms(1000)));
        assert!(!gate.try_admit(&caller, t0 + ms(1400)));
        // Measured from t0, not from the rejected attempts.
        assert!(gate.try_admit(&caller, t0 + ms(1500)));
    }

    #[test]
    fn distinct_callers_are_independent() {
        let gate = AdmissionGate::default();
        let t = Instant::now();
        assert!(gate.try_admit(&"a".into(), t));
        assert!(gate.try_admit(&"b".into(), t));
        assert!(!gate.try_admit(&"a".into(), t));
        assert!(!gate.try_admit(&"b".into(), t));
    }

    #[test]
    fn counters_track_outcomes() {
        let gate = AdmissionGate::default();
        let caller = CallerId::new("dave");
        let t0 = Instant::now();
        gate.try_admit(&caller, t0);
        gate.try_admit(&caller, t0 + ms(10));
        gate.try_admit(&caller, t0 + ms(20));
        let snap = gate.snapshot();
        assert_eq!(snap.admitted_total, 1);
        assert_eq!(snap.rejected_total, 2);
        assert_eq!(snap.tracked_callers, 1);
        assert_eq!(snap.interval_ms, 1500);
    }

    #[test]
    fn sweep_removes_only_stale_entries() {
        let gate = AdmissionGate::with_retention(ms(1500), ms(10_000));
        let t0 = Instant::now();
        gate.try_admit(&"old".into(), t0);
        gate.try_admit(&"fresh".into(), t0 + ms(9_000));

        assert_eq!(gate.sweep(t0 + ms(10_000)), 1);
        assert_eq!(gate.len(), 1);
        // The surviving caller is still rate limited.
        assert!(!gate.try_admit(&"fresh".into(), t0 + ms(10_000)));
        // The evicted caller is simply new again.
        assert!(gate.try_admit(&"old".into(), t0 + ms(10_000)));
    }

    #[test]
    fn retention_never_shorter_than_interval() {
        let gate = AdmissionGate::with_retention(ms(1500), ms(1));
        let t0 = Instant::now();
        gate.try_admit(&"x".into(), t0);
        assert_eq!(gate.sweep(t0 + ms(1000)), 0);
        assert!(!gate.try_admit(&"x".into(), t0 + ms(1000)));
    }

    #[test]
    fn concurrent_same_caller_admits_exactly_once() {
        const THREADS: usize = 16;
        let gate = Arc::new(AdmissionGate::default());
        let barrier = Arc::new(Barrier::new(THREADS));
        let now = Instant::now();

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    gate.try_admit(&CallerId::new("racer"), now)
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(gate.snapshot().rejected_total, (THREADS - 1) as u64);
    }

    #[test]
    fn concurrent_distinct_callers_all_admitted() {
        const THREADS: usize = 16;
        let gate = Arc::new(AdmissionGate::default());
        let barrier = Arc::new(Barrier::new(THREADS));
        let now = Instant::now();

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let gate = Arc::clone(&gate);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    gate.try_admit(&CallerId::new(format!("user-{i}")), now)
                })
            })
            .collect();

        assert!(handles.into_iter().all(|h| h.join().unwrap()));
        assert_eq!(gate.len(), THREADS);
    }
}
