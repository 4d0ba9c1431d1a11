//! In-memory record service.
//!
//! Serves fixed patients, doctors and visits, counts every call per
//! lookup key, and can be told to fail specific keys. Used to exercise the
//! scheduler and resolver graph without a network.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{GatewayError, RecordGateway};
use crate::models::{Doctor, LookupKey, Patient, Visit};

#[derive(Default)]
struct Failures {
    /// Fails every call for the key.
    always: HashMap<LookupKey, GatewayError>,
    /// Fails the next N calls for the key, then serves normally.
    transient: HashMap<LookupKey, (usize, GatewayError)>,
}

#[derive(Default)]
pub struct InMemoryGateway {
    patients: HashMap<String, Patient>,
    doctors: HashMap<String, Doctor>,
    visits: Vec<Visit>,
    latency: Option<Duration>,
    failures: Mutex<Failures>,
    calls: Mutex<HashMap<LookupKey, usize>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patient(mut self, id: &str, name: &str) -> Self {
        self.patients.insert(
            id.to_string(),
            Patient {
                id: id.to_string(),
                name: name.to_string(),
            },
        );
        self
    }

    pub fn with_doctor(mut self, id: &str, name: &str) -> Self {
        self.doctors.insert(
            id.to_string(),
            Doctor {
                id: id.to_string(),
                name: Some(name.to_string()),
            },
        );
        self
    }

    /// Record a visit. Visit lists are served in insertion order.
    pub fn with_visit(mut self, patient_id: &str, doctor_id: &str) -> Self {
        self.visits.push(Visit::between(patient_id, doctor_id));
        self
    }

    /// Delay every call, so concurrent requesters overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every call for `key` with `error`.
    pub fn fail(&self, key: LookupKey, error: GatewayError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.always.insert(key, error);
        }
    }

    /// Fail the next `times` calls for `key`, then serve normally.
    pub fn fail_times(&self, key: LookupKey, times: usize, error: GatewayError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.transient.insert(key, (times, error));
        }
    }

    /// Number of calls received for `key`.
    pub fn calls(&self, key: &LookupKey) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of calls received across all keys.
    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }

    async fn enter(&self, key: &LookupKey) -> Result<(), GatewayError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(key.clone()).or_insert(0) += 1;
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut failures = self.failures.lock().map_err(|_| GatewayError::Transport {
            url: "memory".into(),
            reason: "failure table poisoned".into(),
        })?;
        if let Some(err) = failures.always.get(key) {
            return Err(err.clone());
        }
        if let Some((remaining, err)) = failures.transient.get_mut(key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(err.clone());
            }
        }
        Ok(())
    }

    fn visits_where<F>(&self, pred: F) -> Vec<Visit>
    where
        F: Fn(&Visit) -> bool,
    {
        self.visits.iter().filter(|v| pred(v)).cloned().collect()
    }
}

#[async_trait]
impl RecordGateway for InMemoryGateway {
    async fn fetch_doctor(&self, id: &str) -> Result<Doctor, GatewayError> {
        let key = LookupKey::doctor(id);
        self.enter(&key).await?;
        self.doctors
            .get(id)
            .cloned()
            .ok_or(GatewayError::NotFound(key))
    }

    async fn fetch_patient(&self, id: &str) -> Result<Patient, GatewayError> {
        let key = LookupKey::patient(id);
        self.enter(&key).await?;
        self.patients
            .get(id)
            .cloned()
            .ok_or(GatewayError::NotFound(key))
    }

    async fn fetch_visits_by_patient(&self, id: &str) -> Result<Vec<Visit>, GatewayError> {
        self.enter(&LookupKey::visits_by_patient(id)).await?;
        Ok(self.visits_where(|v| v.patient_id.as_deref() == Some(id)))
    }

    async fn fetch_visits_by_doctor(&self, id: &str) -> Result<Vec<Visit>, GatewayError> {
        self.enter(&LookupKey::visits_by_doctor(id)).await?;
        Ok(self.visits_where(|v| v.doctor_id.as_deref() == Some(id)))
    }
}
