//! Process-wide appointment store backing `createAppointment`.
//!
//! Append-only. Ids start at 1 and are assigned under the same lock as the
//! append, so concurrent mutations never share an id and a rejected input
//! never consumes one. Nothing is persisted across restarts.

use std::sync::{Mutex, MutexGuard};

use crate::models::{Appointment, NewAppointment};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AppointmentError {
    #[error("patientId is required")]
    MissingPatientId,
    #[error("doctorId is required")]
    MissingDoctorId,
    #[error("Internal lock error")]
    LockPoisoned,
}

impl AppointmentError {
    /// Whether the caller's input was at fault.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingPatientId | Self::MissingDoctorId)
    }
}

struct StoreInner {
    last_id: u64,
    records: Vec<Appointment>,
}

pub struct AppointmentStore {
    inner: Mutex<StoreInner>,
}

impl AppointmentStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                last_id: 0,
                records: Vec::new(),
            }),
        }
    }

    /// Validate, assign the next id and append.
    ///
    /// Patient and doctor ids are trusted as given; no lookup against the
    /// record service is made.
    pub fn create(&self, input: NewAppointment) -> Result<Appointment, AppointmentError> {
        let patient_id = input.patient_id.trim();
        if patient_id.is_empty() {
            return Err(AppointmentError::MissingPatientId);
        }
        let doctor_id = input.doctor_id.trim();
        if doctor_id.is_empty() {
            return Err(AppointmentError::MissingDoctorId);
        }
        let date = input
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let mut inner = self.lock()?;
        inner.last_id += 1;
        let appointment = Appointment {
            id: inner.last_id,
            patient_id: patient_id.to_string(),
            doctor_id: doctor_id.to_string(),
            date,
            created_at: chrono::Utc::now(),
        };
        inner.records.push(appointment.clone());

        tracing::info!(
            appointment_id = appointment.id,
            patient_id = %appointment.patient_id,
            doctor_id = %appointment.doctor_id,
            "Appointment created"
        );
        Ok(appointment)
    }

    /// All appointments in creation order.
    pub fn list(&self) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.lock()?.records.clone())
    }

    pub fn get(&self, id: u64) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.lock()?.records.iter().find(|a| a.id == id).cloned())
    }

    pub fn len(&self) -> Result<usize, AppointmentError> {
        Ok(self.lock()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppointmentError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, AppointmentError> {
        self.inner.lock().map_err(|_| AppointmentError::LockPoisoned)
    }
}

impl Default for AppointmentStore {
    fn default() -> Self {
        Self::new()
    }
}
