//! Request-scoped batching and deduplication of record lookups.
//!
//! One `Scheduler` is created per logical query and dropped with it. Every
//! resolver that needs a record asks the scheduler instead of the gateway:
//!
//! - Keys requested before the first suspension point form one window.
//!   `load()` yields once so sibling resolvers polled in the same pass can
//!   enqueue, then closes the window with `dispatch()`. Executors that drive
//!   resolution in phases may call `enqueue()` / `dispatch()` directly.
//! - `dispatch()` hands every pending key of a kind to one
//!   `RecordGateway::fetch_many` call, spawned so it runs to completion even
//!   if the requester stops polling.
//! - Each key moves `Pending → InFlight → Resolved | Failed` exactly once.
//!   Terminal outcomes stay cached for the rest of the query, so late
//!   duplicates never reach the gateway.
//! - A failed key only fails its own requesters.

pub mod error;
pub mod retry;

pub use error::LoadError;
pub use retry::RetryPolicy;

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::gateway::{GatewayError, RecordGateway};
use crate::models::{Doctor, LookupKey, LookupKind, Patient, Record, Visit};

type BatchOutput = Result<Arc<HashMap<String, Result<Record, GatewayError>>>, LoadError>;
type BatchFuture = Shared<BoxFuture<'static, BatchOutput>>;

enum Slot {
    /// `awaited` is false while only `enqueue()` has registered the key.
    Pending { awaited: bool },
    InFlight(BatchFuture),
    Resolved(Record),
    Failed(LoadError),
}

impl Slot {
    fn state(&self) -> KeyState {
        match self {
            Slot::Pending { .. } => KeyState::Pending,
            Slot::InFlight(_) => KeyState::InFlight,
            Slot::Resolved(_) => KeyState::Resolved,
            Slot::Failed(_) => KeyState::Failed,
        }
    }
}

/// Observable lifecycle of one lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pending,
    InFlight,
    Resolved,
    Failed,
}

/// Counters for one scheduler lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Lookups requested by resolvers.
    pub requests: usize,
    /// Requests answered by an existing slot instead of a new gateway call.
    pub deduplicated: usize,
    /// Unique keys handed to the gateway.
    pub dispatched_keys: usize,
    /// `fetch_many` calls issued (one per kind per window).
    pub batches: usize,
}

#[derive(Default)]
struct Counters {
    requests: AtomicUsize,
    deduplicated: AtomicUsize,
    dispatched_keys: AtomicUsize,
    batches: AtomicUsize,
}

pub struct Scheduler {
    gateway: Arc<dyn RecordGateway>,
    retry: RetryPolicy,
    slots: Mutex<HashMap<LookupKey, Slot>>,
    counters: Counters,
}

impl Scheduler {
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        Self::with_retry(gateway, RetryPolicy::none())
    }

    pub fn with_retry(gateway: Arc<dyn RecordGateway>, retry: RetryPolicy) -> Self {
        Self {
            gateway,
            retry,
            slots: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    // ── Requesting ──────────────────────────────────────────

    /// Resolve `key`, sharing the gateway call with every other requester
    /// of the same key in this scheduler.
    pub async fn load(&self, key: LookupKey) -> Result<Record, LoadError> {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);

        let window_open = {
            let mut slots = self.lock_slots()?;
            match slots.get(&key) {
                Some(Slot::Resolved(record)) => {
                    self.counters.deduplicated.fetch_add(1, Ordering::Relaxed);
                    return Ok(record.clone());
                }
                Some(Slot::Failed(err)) => {
                    self.counters.deduplicated.fetch_add(1, Ordering::Relaxed);
                    return Err(err.clone());
                }
                Some(Slot::InFlight(_)) => {
                    self.counters.deduplicated.fetch_add(1, Ordering::Relaxed);
                    false
                }
                Some(&Slot::Pending { awaited }) => {
                    if awaited {
                        self.counters.deduplicated.fetch_add(1, Ordering::Relaxed);
                    }
                    slots.insert(key.clone(), Slot::Pending { awaited: true });
                    true
                }
                None => {
                    slots.insert(key.clone(), Slot::Pending { awaited: true });
                    true
                }
            }
        };

        if window_open {
            tokio::task::yield_now().await;
            self.dispatch()?;
        }

        let batch = {
            let slots = self.lock_slots()?;
            match slots.get(&key) {
                Some(Slot::InFlight(batch)) => batch.clone(),
                Some(Slot::Resolved(record)) => return Ok(record.clone()),
                Some(Slot::Failed(err)) => return Err(err.clone()),
                // dispatch() moved every pending key to InFlight above
                Some(Slot::Pending { .. }) | None => {
                    return Err(LoadError::MissingFromBatch(key.clone()))
                }
            }
        };

        let outcome = settle(&key, batch.await);
        self.finish(&key, &outcome);
        outcome
    }

    /// Register `key` for the next window without waiting for it.
    /// Returns `false` if the key is already known to this scheduler.
    pub fn enqueue(&self, key: LookupKey) -> Result<bool, LoadError> {
        let mut slots = self.lock_slots()?;
        if slots.contains_key(&key) {
            return Ok(false);
        }
        slots.insert(key, Slot::Pending { awaited: false });
        Ok(true)
    }

    /// Close the current window: issue one gateway batch per kind covering
    /// every pending key. Returns the number of keys dispatched.
    pub fn dispatch(&self) -> Result<usize, LoadError> {
        let mut slots = self.lock_slots()?;

        let mut by_kind: BTreeMap<LookupKind, Vec<String>> = BTreeMap::new();
        for (key, slot) in slots.iter() {
            if matches!(slot, Slot::Pending { .. }) {
                by_kind.entry(key.kind).or_default().push(key.id.clone());
            }
        }

        let mut dispatched = 0;
        for (kind, mut ids) in by_kind {
            ids.sort();
            let batch = self.spawn_batch(kind, ids.clone());
            for id in ids {
                slots.insert(LookupKey::new(kind, id), Slot::InFlight(batch.clone()));
                dispatched += 1;
            }
            self.counters.batches.fetch_add(1, Ordering::Relaxed);
        }

        self.counters
            .dispatched_keys
            .fetch_add(dispatched, Ordering::Relaxed);
        Ok(dispatched)
    }

    // ── Typed loaders ───────────────────────────────────────

    pub async fn load_doctor(&self, id: &str) -> Result<Doctor, LoadError> {
        let key = LookupKey::doctor(id);
        match self.load(key.clone()).await? {
            Record::Doctor(doctor) => Ok(doctor),
            _ => Err(LoadError::KindMismatch(key)),
        }
    }

    pub async fn load_patient(&self, id: &str) -> Result<Patient, LoadError> {
        let key = LookupKey::patient(id);
        match self.load(key.clone()).await? {
            Record::Patient(patient) => Ok(patient),
            _ => Err(LoadError::KindMismatch(key)),
        }
    }

    pub async fn load_visits_by_patient(&self, id: &str) -> Result<Arc<Vec<Visit>>, LoadError> {
        self.load_visits(LookupKey::visits_by_patient(id)).await
    }

    pub async fn load_visits_by_doctor(&self, id: &str) -> Result<Arc<Vec<Visit>>, LoadError> {
        self.load_visits(LookupKey::visits_by_doctor(id)).await
    }

    async fn load_visits(&self, key: LookupKey) -> Result<Arc<Vec<Visit>>, LoadError> {
        match self.load(key.clone()).await? {
            Record::Visits(visits) => Ok(visits),
            _ => Err(LoadError::KindMismatch(key)),
        }
    }

    // ── Observability ───────────────────────────────────────

    pub fn state(&self, key: &LookupKey) -> Option<KeyState> {
        self.slots.lock().ok()?.get(key).map(Slot::state)
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            requests: self.counters.requests.load(Ordering::Relaxed),
            deduplicated: self.counters.deduplicated.load(Ordering::Relaxed),
            dispatched_keys: self.counters.dispatched_keys.load(Ordering::Relaxed),
            batches: self.counters.batches.load(Ordering::Relaxed),
        }
    }

    // ── Internal ────────────────────────────────────────────

    fn lock_slots(&self) -> Result<MutexGuard<'_, HashMap<LookupKey, Slot>>, LoadError> {
        self.slots.lock().map_err(|_| LoadError::LockPoisoned)
    }

    fn spawn_batch(&self, kind: LookupKind, ids: Vec<String>) -> BatchFuture {
        tracing::debug!(%kind, keys = ids.len(), "Dispatching lookup window");

        let gateway = Arc::clone(&self.gateway);
        let retry = self.retry;
        let handle =
            tokio::spawn(async move { retry.run(gateway.as_ref(), kind, ids).await });

        async move {
            handle
                .await
                .map(Arc::new)
                .map_err(|e| LoadError::TaskFailed(e.to_string()))
        }
        .boxed()
        .shared()
    }

    /// Record a terminal outcome so later requesters skip the batch.
    fn finish(&self, key: &LookupKey, outcome: &Result<Record, LoadError>) {
        let Ok(mut slots) = self.slots.lock() else {
            return;
        };
        if let Some(slot) = slots.get_mut(key) {
            if matches!(slot, Slot::InFlight(_)) {
                *slot = match outcome {
                    Ok(record) => Slot::Resolved(record.clone()),
                    Err(err) => Slot::Failed(err.clone()),
                };
            }
        }
    }
}

fn settle(key: &LookupKey, output: BatchOutput) -> Result<Record, LoadError> {
    let results = output?;
    match results.get(&key.id) {
        Some(Ok(record)) if record.matches(key.kind) => Ok(record.clone()),
        Some(Ok(_)) => Err(LoadError::KindMismatch(key.clone())),
        Some(Err(err)) => Err(LoadError::Gateway(err.clone())),
        None => Err(LoadError::MissingFromBatch(key.clone())),
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use futures_util::future::join_all;

    use crate::gateway::InMemoryGateway;

    fn gateway() -> Arc<InMemoryGateway> {
        Arc::new(
            InMemoryGateway::new()
                .with_patient("5", "Sanjay Dutt")
                .with_doctor("1", "Dr. X")
                .with_doctor("2", "Dr. Y")
                .with_doctor("3", "Dr. Z")
                .with_visit("5", "1")
                .with_latency(Duration::from_millis(10)),
        )
    }

    fn transport_failure() -> GatewayError {
        GatewayError::Transport {
            url: "memory".into(),
            reason: "connection refused".into(),
        }
    }

    #[tokio::test]
    async fn concurrent_requests_for_one_key_share_a_call() {
        let gw = gateway();
        let scheduler = Scheduler::new(gw.clone());

        let (a, b) = tokio::join!(scheduler.load_doctor("1"), scheduler.load_doctor("1"));

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(gw.calls(&LookupKey::doctor("1")), 1);
        assert_eq!(scheduler.stats().deduplicated, 1);
    }

    #[tokio::test]
    async fn keys_requested_together_form_one_window() {
        let gw = gateway();
        let scheduler = Scheduler::new(gw.clone());

        let ids = ["1", "2", "1", "3", "2"];
        let doctors = join_all(ids.iter().map(|id| scheduler.load_doctor(id))).await;

        let names: Vec<_> = doctors
            .into_iter()
            .map(|d| d.unwrap().name.unwrap())
            .collect();
        assert_eq!(names, ["Dr. X", "Dr. Y", "Dr. X", "Dr. Z", "Dr. Y"]);

        let stats = scheduler.stats();
        assert_eq!(stats.requests, 5);
        assert_eq!(stats.dispatched_keys, 3);
        assert_eq!(stats.batches, 1);
        assert_eq!(gw.total_calls(), 3);
    }

    #[tokio::test]
    async fn late_duplicates_reuse_the_terminal_value() {
        let gw = gateway();
        let scheduler = Scheduler::new(gw.clone());

        let first = scheduler.load_doctor("1").await.unwrap();
        assert_eq!(scheduler.state(&LookupKey::doctor("1")), Some(KeyState::Resolved));
        let second = scheduler.load_doctor("1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(gw.calls(&LookupKey::doctor("1")), 1);
    }

    #[tokio::test]
    async fn failures_are_cached_for_the_query() {
        let gw = gateway();
        gw.fail(LookupKey::doctor("2"), transport_failure());
        let scheduler = Scheduler::new(gw.clone());

        let first = scheduler.load_doctor("2").await.unwrap_err();
        let second = scheduler.load_doctor("2").await.unwrap_err();

        assert_eq!(first, second);
        assert_eq!(scheduler.state(&LookupKey::doctor("2")), Some(KeyState::Failed));
        assert_eq!(gw.calls(&LookupKey::doctor("2")), 1);
    }

    #[tokio::test]
    async fn failed_key_does_not_affect_siblings() {
        let gw = gateway();
        gw.fail(LookupKey::doctor("2"), transport_failure());
        let scheduler = Scheduler::new(gw.clone());

        let (ok, failed) = tokio::join!(scheduler.load_doctor("1"), scheduler.load_doctor("2"));

        assert_eq!(ok.unwrap().name.as_deref(), Some("Dr. X"));
        assert_eq!(failed.unwrap_err(), LoadError::Gateway(transport_failure()));
        assert_eq!(scheduler.stats().batches, 1);
    }

    #[tokio::test]
    async fn separate_schedulers_never_share_results() {
        let gw = gateway();

        let first = Scheduler::new(gw.clone());
        first.load_doctor("1").await.unwrap();
        drop(first);

        let second = Scheduler::new(gw.clone());
        assert_eq!(second.state(&LookupKey::doctor("1")), None);
        second.load_doctor("1").await.unwrap();

        assert_eq!(gw.calls(&LookupKey::doctor("1")), 2);
    }

    #[tokio::test]
    async fn explicit_dispatch_closes_the_window() {
        let gw = gateway();
        let scheduler = Scheduler::new(gw.clone());

        assert!(scheduler.enqueue(LookupKey::doctor("1")).unwrap());
        assert!(scheduler.enqueue(LookupKey::doctor("2")).unwrap());
        assert!(scheduler.enqueue(LookupKey::patient("5")).unwrap());
        assert!(!scheduler.enqueue(LookupKey::doctor("1")).unwrap());
        assert_eq!(scheduler.state(&LookupKey::doctor("1")), Some(KeyState::Pending));
        assert_eq!(gw.total_calls(), 0);

        assert_eq!(scheduler.dispatch().unwrap(), 3);
        assert_eq!(scheduler.state(&LookupKey::doctor("2")), Some(KeyState::InFlight));
        assert_eq!(scheduler.stats().batches, 2);
        assert_eq!(scheduler.dispatch().unwrap(), 0);

        let patient = scheduler.load_patient("5").await.unwrap();
        assert_eq!(patient.name, "Sanjay Dutt");
        scheduler.load_doctor("1").await.unwrap();
        assert_eq!(gw.calls(&LookupKey::patient("5")), 1);
        assert_eq!(gw.calls(&LookupKey::doctor("1")), 1);
    }

    #[tokio::test]
    async fn first_load_of_an_enqueued_key_is_not_deduplicated() {
        let gw = gateway();
        let scheduler = Scheduler::new(gw.clone());

        scheduler.enqueue(LookupKey::doctor("1")).unwrap();
        let (a, b) = tokio::join!(scheduler.load_doctor("1"), scheduler.load_doctor("1"));
        a.unwrap();
        b.unwrap();

        let stats = scheduler.stats();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.deduplicated, 1);
        assert_eq!(stats.dispatched_keys, 1);
        assert_eq!(gw.calls(&LookupKey::doctor("1")), 1);
    }

    #[tokio::test]
    async fn dispatched_calls_run_without_a_waiter() {
        let gw = gateway();
        let scheduler = Scheduler::new(gw.clone());

        scheduler.enqueue(LookupKey::doctor("3")).unwrap();
        scheduler.dispatch().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(gw.calls(&LookupKey::doctor("3")), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_trigger_one_call_per_key() {
        let gw = gateway();
        let scheduler = Arc::new(Scheduler::new(gw.clone()));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let scheduler = Arc::clone(&scheduler);
                tokio::spawn(async move { scheduler.load_doctor("1").await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().id, "1");
        }

        assert_eq!(gw.calls(&LookupKey::doctor("1")), 1);
    }

    #[tokio::test]
    async fn visit_lists_are_deduplicated_too() {
        let gw = gateway();
        let scheduler = Scheduler::new(gw.clone());

        let (a, b) = tokio::join!(
            scheduler.load_visits_by_patient("5"),
            scheduler.load_visits_by_patient("5")
        );

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(gw.calls(&LookupKey::visits_by_patient("5")), 1);
    }

    #[tokio::test]
    async fn retry_policy_recovers_transient_failures() {
        let gw = gateway();
        gw.fail_times(LookupKey::doctor("1"), 1, transport_failure());
        let scheduler =
            Scheduler::with_retry(gw.clone(), RetryPolicy::new(2, Duration::from_millis(1)));

        assert!(scheduler.load_doctor("1").await.is_ok());
        assert_eq!(gw.calls(&LookupKey::doctor("1")), 2);
    }

    #[tokio::test]
    async fn not_found_surfaces_as_load_error() {
        let scheduler = Scheduler::new(gateway());
        let err = scheduler.load_patient("nonexistent").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
