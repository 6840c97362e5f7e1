//! Domain models for the clinic record store.

mod drug_update;
mod identity;
mod patient;
mod soap;
mod status;
mod triage;

pub use drug_update::*;
pub use identity::*;
pub use patient::*;
pub use soap::*;
pub use status::*;
pub use triage::*;
