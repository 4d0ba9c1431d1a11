//! Relationship derivation, independent of the GraphQL layer.
//!
//! Relationships are not stored: a patient's doctors are the doctors named
//! by the patient's visits, and symmetrically for a doctor's patients. Every
//! lookup goes through the query's scheduler, so a doctor shared by many
//! patients is fetched once per query.
//!
//! List results are positional, one entry per visit (repeat visits yield
//! repeat entries), and each entry carries its own outcome.

use futures_util::future::join_all;

use crate::gateway::GatewayError;
use crate::models::{Doctor, LookupKey, Patient};
use crate::scheduler::{LoadError, Scheduler};

/// Single-entity lookup: absence is `Ok(None)`, other failures propagate.
pub async fn find_patient(scheduler: &Scheduler, id: &str) -> Result<Option<Patient>, LoadError> {
    absent_as_none(scheduler.load_patient(id).await)
}

pub async fn find_doctor(scheduler: &Scheduler, id: &str) -> Result<Option<Doctor>, LoadError> {
    absent_as_none(scheduler.load_doctor(id).await)
}

/// Doctors seen by a patient, in visit order.
///
/// The outer error is a failure to fetch the visit list; inner errors
/// belong to individual doctors.
pub async fn doctors_of_patient(
    scheduler: &Scheduler,
    patient_id: &str,
) -> Result<Vec<Result<Doctor, LoadError>>, LoadError> {
    let visits = scheduler.load_visits_by_patient(patient_id).await?;
    let lookups = visits.iter().map(|visit| async move {
        match visit.doctor_id.as_deref() {
            Some(doctor_id) => scheduler.load_doctor(doctor_id).await,
            None => Err(incomplete_visit(
                LookupKey::visits_by_patient(patient_id),
                "doctorId",
            )),
        }
    });
    Ok(join_all(lookups).await)
}

/// Patients seen by a doctor, in visit order.
pub async fn patients_of_doctor(
    scheduler: &Scheduler,
    doctor_id: &str,
) -> Result<Vec<Result<Patient, LoadError>>, LoadError> {
    let visits = scheduler.load_visits_by_doctor(doctor_id).await?;
    let lookups = visits.iter().map(|visit| async move {
        match visit.patient_id.as_deref() {
            Some(patient_id) => scheduler.load_patient(patient_id).await,
            None => Err(incomplete_visit(
                LookupKey::visits_by_doctor(doctor_id),
                "patientId",
            )),
        }
    });
    Ok(join_all(lookups).await)
}

fn absent_as_none<T>(result: Result<T, LoadError>) -> Result<Option<T>, LoadError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

fn incomplete_visit(key: LookupKey, field: &str) -> LoadError {
    LoadError::Gateway(GatewayError::Decode {
        key,
        reason: format!("visit without {field}"),
    })
}
