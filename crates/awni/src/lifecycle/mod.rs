//! Lifecycle controllers orchestrating the request and volunteer
//! workflows over an injected persistence gateway.

pub mod request;
pub mod volunteer;

pub use request::{NewRequest, RequestController};
pub use volunteer::{Actor, ProfileUpdate, VolunteerController};
