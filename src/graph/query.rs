use std::sync::Arc;

use async_graphql::{Context, Object, Result, ID};

use super::context::QueryContext;
use super::errors::{appointment_error, load_error, null_with_error};
use super::relations;
use super::types::{AppointmentNode, DoctorNode, PatientNode};
use crate::appointments::AppointmentStore;

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn message(&self) -> Option<String> {
        Some("Hello World".to_string())
    }

    /// Patient by id; `null` when the record service has no such patient.
    async fn patient(&self, ctx: &Context<'_>, id: ID) -> Result<Option<PatientNode>> {
        let query = QueryContext::from_ctx(ctx)?;
        match relations::find_patient(query.scheduler(), &id).await {
            Ok(patient) => Ok(patient.map(PatientNode)),
            Err(e) => Ok(null_with_error(ctx, load_error(&e))),
        }
    }

    /// Doctor by id; `null` when the record service has no such doctor.
    async fn doctor(&self, ctx: &Context<'_>, id: ID) -> Result<Option<DoctorNode>> {
        let query = QueryContext::from_ctx(ctx)?;
        match relations::find_doctor(query.scheduler(), &id).await {
            Ok(doctor) => Ok(doctor.map(DoctorNode)),
            Err(e) => Ok(null_with_error(ctx, load_error(&e))),
        }
    }

    /// Appointments created since the process started, oldest first.
    async fn appointments(&self, ctx: &Context<'_>) -> Result<Vec<AppointmentNode>> {
        let store = ctx.data::<Arc<AppointmentStore>>()?;
        let appointments = store.list().map_err(|e| appointment_error(&e))?;
        Ok(appointments.into_iter().map(AppointmentNode).collect())
    }

    async fn appointment(&self, ctx: &Context<'_>, id: ID) -> Result<Option<AppointmentNode>> {
        let Ok(id) = id.parse::<u64>() else {
            return Ok(None);
        };
        let store = ctx.data::<Arc<AppointmentStore>>()?;
        match store.get(id) {
            Ok(appointment) => Ok(appointment.map(AppointmentNode)),
            Err(e) => Ok(null_with_error(ctx, appointment_error(&e))),
        }
    }
}
