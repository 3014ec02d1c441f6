//! Job records — data model, file-backed store, and HTTP routes.

pub mod model;
pub mod routes;
pub mod store;

pub use model::{AddOutcome, ApplyOutcome, JobFilter, JobRecord, NewJob, ValidationError};
pub use routes::{JobsState, job_routes};
pub use store::JobStore;
