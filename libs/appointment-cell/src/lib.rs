// libs/appointment-cell/src/lib.rs
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Appointment, AppointmentCandidate, AppointmentCondition, AppointmentError, AppointmentStatus,
    AppointmentSummary, SlotIssue, ValidationVerdict,
};
pub use router::appointment_routes;
pub use services::{
    AppointmentLifecycleService, AppointmentQueryService, AppointmentValidationService,
};
