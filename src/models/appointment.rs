use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An appointment created through the `createAppointment` mutation.
/// Never fetched from the record service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: u64,
    pub patient_id: String,
    pub doctor_id: String,
    pub date: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied appointment fields, validated by the store before any id
/// is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub date: Option<String>,
}
