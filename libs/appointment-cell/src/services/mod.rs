// libs/appointment-cell/src/services/mod.rs
pub mod lifecycle;
pub mod queries;
pub mod validation;

pub use lifecycle::AppointmentLifecycleService;
pub use queries::AppointmentQueryService;
pub use validation::AppointmentValidationService;
