use std::sync::Arc;

use async_graphql::{Context, Object, Result};

use super::errors::{appointment_error, null_with_error};
use super::types::{AppointmentNode, CreateAppointmentRequest, CreateAppointmentResponse};
use crate::appointments::AppointmentStore;

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Record an appointment in the in-process store. Either the appointment
    /// is appended and returned, or validation fails and nothing is stored.
    async fn create_appointment(
        &self,
        ctx: &Context<'_>,
        input: CreateAppointmentRequest,
    ) -> Result<Option<CreateAppointmentResponse>> {
        let store = ctx.data::<Arc<AppointmentStore>>()?;
        match store.create(input.into()) {
            Ok(appointment) => Ok(Some(CreateAppointmentResponse {
                appointment: Some(AppointmentNode(appointment)),
            })),
            Err(e) => Ok(null_with_error(ctx, appointment_error(&e))),
        }
    }
}
