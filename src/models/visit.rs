use serde::{Deserialize, Serialize};

/// Join record linking a patient and a doctor.
///
/// `/visit/patient/{id}` rows carry `doctorId`, `/visit/doctor/{id}` rows
/// carry `patientId`; either side may be missing depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    #[serde(default, deserialize_with = "super::deserialize_opt_id")]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "super::deserialize_opt_id")]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl Visit {
    pub fn between(patient_id: &str, doctor_id: &str) -> Self {
        Self {
            patient_id: Some(patient_id.to_string()),
            doctor_id: Some(doctor_id.to_string()),
            date: None,
        }
    }
}
