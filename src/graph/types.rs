use async_graphql::{Context, InputObject, Object, Result, SimpleObject, ID};

use super::context::QueryContext;
use super::errors::{isolate_failures, load_error, null_with_error};
use super::relations;
use crate::models::{Appointment, Doctor, NewAppointment, Patient};

// ═══════════════════════════════════════════════════════════
// Patient
// ═══════════════════════════════════════════════════════════

pub struct PatientNode(pub Patient);

#[Object(name = "Patient")]
impl PatientNode {
    async fn id(&self) -> ID {
        ID(self.0.id.clone())
    }

    async fn name(&self) -> String {
        self.0.name.clone()
    }

    /// Doctors this patient has visited, one entry per visit.
    async fn doctors(&self, ctx: &Context<'_>) -> Result<Option<Vec<Option<DoctorNode>>>> {
        let query = QueryContext::from_ctx(ctx)?;
        match relations::doctors_of_patient(query.scheduler(), &self.0.id).await {
            Ok(doctors) => Ok(Some(isolate_failures(ctx, doctors, DoctorNode))),
            Err(e) => Ok(null_with_error(ctx, load_error(&e))),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Doctor
// ═══════════════════════════════════════════════════════════

pub struct DoctorNode(pub Doctor);

#[Object(name = "Doctor")]
impl DoctorNode {
    async fn id(&self) -> ID {
        ID(self.0.id.clone())
    }

    async fn name(&self) -> Option<String> {
        self.0.name.clone()
    }

    /// Patients who have visited this doctor, one entry per visit.
    async fn patients(&self, ctx: &Context<'_>) -> Result<Option<Vec<Option<PatientNode>>>> {
        let query = QueryContext::from_ctx(ctx)?;
        match relations::patients_of_doctor(query.scheduler(), &self.0.id).await {
            Ok(patients) => Ok(Some(isolate_failures(ctx, patients, PatientNode))),
            Err(e) => Ok(null_with_error(ctx, load_error(&e))),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Appointment
// ═══════════════════════════════════════════════════════════

pub struct AppointmentNode(pub Appointment);

#[Object(name = "Appointment")]
impl AppointmentNode {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn patient_id(&self) -> Option<ID> {
        Some(ID(self.0.patient_id.clone()))
    }

    async fn doctor_id(&self) -> Option<ID> {
        Some(ID(self.0.doctor_id.clone()))
    }

    async fn date(&self) -> Option<String> {
        self.0.date.clone()
    }

    /// RFC 3339 creation timestamp.
    async fn created_at(&self) -> String {
        self.0.created_at.to_rfc3339()
    }
}

#[derive(InputObject)]
pub struct CreateAppointmentRequest {
    pub patient_id: ID,
    pub doctor_id: ID,
    pub date: Option<String>,
}

impl From<CreateAppointmentRequest> for NewAppointment {
    fn from(input: CreateAppointmentRequest) -> Self {
        Self {
            patient_id: input.patient_id.0,
            doctor_id: input.doctor_id.0,
            date: input.date,
        }
    }
}

#[derive(SimpleObject)]
pub struct CreateAppointmentResponse {
    pub appointment: Option<AppointmentNode>,
}
