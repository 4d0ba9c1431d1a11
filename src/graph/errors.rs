//! Mapping of lookup and mutation failures onto GraphQL errors.
//!
//! Every error carries `extensions.code`: `TRANSPORT_FAILURE`,
//! `DECODE_FAILURE`, `NOT_FOUND`, `VALIDATION_FAILED` or `INTERNAL`.

use async_graphql::{Context, Error, ErrorExtensions, PathSegment};

use crate::appointments::AppointmentError;
use crate::scheduler::LoadError;

pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
pub const INTERNAL: &str = "INTERNAL";

fn coded(message: String, code: &'static str) -> Error {
    Error::new(message).extend_with(|_, ext| ext.set("code", code.to_string()))
}

pub fn load_error(err: &LoadError) -> Error {
    if err.category().is_none() {
        tracing::error!(error = %err, "Lookup failed inside the scheduler");
    }
    coded(err.to_string(), err.code())
}

pub fn appointment_error(err: &AppointmentError) -> Error {
    if err.is_validation() {
        coded(err.to_string(), VALIDATION_FAILED)
    } else {
        tracing::error!(error = %err, "Appointment store failure");
        coded("An internal error occurred".to_string(), INTERNAL)
    }
}

/// Report `error` at the current field path and resolve the field to `null`.
/// Returning `Err` from a nullable field drops the key from `data` instead.
pub fn null_with_error<T>(ctx: &Context<'_>, error: Error) -> Option<T> {
    ctx.add_error(ctx.set_error_path(error.into_server_error(ctx.item.pos)));
    None
}

/// Resolve a relationship list item by item. Failed items become `null`
/// and report an error at `<field path>.<index>`; the rest resolve normally.
pub fn isolate_failures<T, N, F>(
    ctx: &Context<'_>,
    items: Vec<Result<T, LoadError>>,
    wrap: F,
) -> Vec<Option<N>>
where
    F: Fn(T) -> N,
{
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Ok(value) => Some(wrap(value)),
            Err(err) => {
                let mut error = ctx.set_error_path(load_error(&err).into_server_error(ctx.item.pos));
                error.path.push(PathSegment::Index(index));
                ctx.add_error(error);
                None
            }
        })
        .collect()
}
