//! `awni` - Emergency response coordination for Sudan
//!
//! This library provides the core workflow for connecting emergency requests
//! with verified volunteers: automatic priority triage of free-text requests,
//! region-based volunteer matching, and the request and volunteer lifecycles
//! over a pluggable persistence gateway.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod matching;
pub mod notify;
pub mod request;
pub mod store;
pub mod validate;
pub mod volunteer;

pub use classify::{Classification, KeywordClassifier, PriorityClassifier};
pub use config::Config;
pub use error::{Error, Result};
pub use lifecycle::{RequestController, VolunteerController};
pub use logging::init_logging;
pub use request::{EmergencyRequest, PriorityLevel, RequestStatus};
pub use store::{MemoryGateway, PersistenceGateway, SqliteGateway};
pub use volunteer::{Volunteer, VolunteerStatus};
