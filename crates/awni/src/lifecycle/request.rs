//! Request lifecycle orchestration.
//!
//! Drives the status state machine over the persistence gateway:
//!
//! ```text
//! pending ──assign──▶ assigned ──resolve──▶ resolved (terminal)
//!    │                   │
//!    └──────cancel───────┴──────▶ cancelled (terminal)
//! ```
//!
//! While pending, the submitter may edit the description or delete the
//! request; while assigned, an ETA may be set; once resolved, a report may
//! be attached exactly once.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classify::{classify_or_default, PriorityClassifier};
use crate::error::{Error, Result};
use crate::matching::select_volunteer;
use crate::request::{Assignment, EmergencyRequest, RequestStatus};
use crate::store::{PersistenceGateway, RequestPatch};
use crate::validate;

/// Intake fields for a new emergency request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    /// Free-text description of the emergency.
    pub request_text: String,
    /// Free-text location.
    pub location: String,
    /// Submitter contact phone.
    pub contact_phone: String,
}

/// Orchestrates creation, assignment, and status transitions of requests.
///
/// Constructed with its collaborators rather than reaching for ambient
/// singletons, so tests substitute an in-memory gateway and a canned
/// classifier.
pub struct RequestController {
    gateway: Arc<dyn PersistenceGateway>,
    classifier: Arc<dyn PriorityClassifier>,
    fallback_to_first: bool,
}

impl std::fmt::Debug for RequestController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestController")
            .field("fallback_to_first", &self.fallback_to_first)
            .finish_non_exhaustive()
    }
}

impl RequestController {
    /// Create a controller with the first-volunteer matching fallback
    /// enabled (the default policy).
    #[must_use]
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        classifier: Arc<dyn PriorityClassifier>,
    ) -> Self {
        Self {
            gateway,
            classifier,
            fallback_to_first: true,
        }
    }

    /// Override the matching fallback policy.
    #[must_use]
    pub fn with_matching_fallback(mut self, fallback_to_first: bool) -> Self {
        self.fallback_to_first = fallback_to_first;
        self
    }

    /// Create a new pending request.
    ///
    /// Validation runs before the classifier or the gateway is touched, so
    /// a rejected submission has no side effects. A classifier failure is
    /// absorbed by the fixed default classification and never fails
    /// creation.
    ///
    /// # Errors
    ///
    /// Returns `Validation` on malformed input, or a storage error if
    /// persistence fails.
    pub async fn create(&self, new: NewRequest) -> Result<EmergencyRequest> {
        validate::validate_request_text(&new.request_text)?;
        validate::validate_location(&new.location)?;
        validate::validate_phone(&new.contact_phone)?;

        let classification = classify_or_default(self.classifier.as_ref(), &new.request_text).await;

        let mut request = EmergencyRequest::new(
            new.request_text,
            new.location,
            new.contact_phone,
            classification.priority,
            classification.reason,
        );
        let id = self.gateway.create_request(&request)?;
        request.id = Some(id);

        info!(
            "Created request {} with priority {} at {}",
            id, request.priority, request.location
        );
        Ok(request)
    }

    /// Match and assign a volunteer to a pending request.
    ///
    /// Queries the verified volunteers, runs the matching engine, and
    /// applies status and assignment as one combined write under the
    /// revision guard. Returns `Ok(None)` when no volunteer could be
    /// selected (empty verified list, or no city match with the fallback
    /// disabled).
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the request is pending, `NotFound`
    /// for an unknown id, and `Conflict` if another writer got there
    /// first.
    pub fn assign(&self, id: i64) -> Result<Option<EmergencyRequest>> {
        let request = self.load(id)?;
        if request.status != RequestStatus::Pending {
            return Err(Error::invalid_state(
                "request",
                request.status.to_string(),
                "assign",
            ));
        }

        let verified = self.gateway.verified_volunteers()?;
        let Some(volunteer) = select_volunteer(&request.location, &verified, self.fallback_to_first)
        else {
            warn!("No volunteer available for request {}", id);
            return Ok(None);
        };

        let patch = RequestPatch::assign(Assignment {
            volunteer_id: volunteer.id.clone(),
            volunteer_name: volunteer.full_name.clone(),
        });
        let updated = self.gateway.update_request(id, request.revision, &patch)?;

        info!(
            "Assigned request {} to volunteer {} ({})",
            id, volunteer.full_name, volunteer.id
        );
        Ok(Some(updated))
    }

    /// Mark an assigned request resolved.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the request is assigned.
    pub fn resolve(&self, id: i64) -> Result<EmergencyRequest> {
        let request = self.load(id)?;
        if request.status != RequestStatus::Assigned {
            return Err(Error::invalid_state(
                "request",
                request.status.to_string(),
                "resolve",
            ));
        }

        let updated = self.gateway.update_request(
            id,
            request.revision,
            &RequestPatch::status(RequestStatus::Resolved),
        )?;
        info!("Resolved request {}", id);
        Ok(updated)
    }

    /// Cancel a pending or assigned request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the request is already terminal.
    pub fn cancel(&self, id: i64) -> Result<EmergencyRequest> {
        let request = self.load(id)?;
        if request.status.is_terminal() {
            return Err(Error::invalid_state(
                "request",
                request.status.to_string(),
                "cancel",
            ));
        }

        let updated = self.gateway.update_request(
            id,
            request.revision,
            &RequestPatch::status(RequestStatus::Cancelled),
        )?;
        info!("Cancelled request {}", id);
        Ok(updated)
    }

    /// Replace the description of a still-pending request.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the new text is too short, `InvalidState`
    /// unless the request is pending.
    pub fn edit_text(&self, id: i64, request_text: &str) -> Result<EmergencyRequest> {
        validate::validate_request_text(request_text)?;

        let request = self.load(id)?;
        if request.status != RequestStatus::Pending {
            return Err(Error::invalid_state(
                "request",
                request.status.to_string(),
                "edit",
            ));
        }

        let patch = RequestPatch {
            request_text: Some(request_text.to_string()),
            ..RequestPatch::default()
        };
        self.gateway.update_request(id, request.revision, &patch)
    }

    /// Set the informational arrival estimate on an assigned request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the request is assigned.
    pub fn set_eta(&self, id: i64, eta: &str) -> Result<EmergencyRequest> {
        validate::validate_non_empty("eta", eta)?;

        let request = self.load(id)?;
        if request.status != RequestStatus::Assigned {
            return Err(Error::invalid_state(
                "request",
                request.status.to_string(),
                "set an ETA on",
            ));
        }

        let patch = RequestPatch {
            eta: Some(eta.to_string()),
            ..RequestPatch::default()
        };
        self.gateway.update_request(id, request.revision, &patch)
    }

    /// Attach the outcome report to a resolved request, exactly once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the request is resolved, `Conflict`
    /// if a report is already attached.
    pub fn attach_report(&self, id: i64, report: &str) -> Result<EmergencyRequest> {
        validate::validate_non_empty("report", report)?;

        let request = self.load(id)?;
        if request.status != RequestStatus::Resolved {
            return Err(Error::invalid_state(
                "request",
                request.status.to_string(),
                "report on",
            ));
        }
        if request.report.is_some() {
            return Err(Error::conflict("a report is already attached"));
        }

        let patch = RequestPatch {
            report: Some(report.to_string()),
            ..RequestPatch::default()
        };
        self.gateway.update_request(id, request.revision, &patch)
    }

    /// Delete a still-pending request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the request is pending.
    pub fn delete(&self, id: i64) -> Result<()> {
        let request = self.load(id)?;
        if request.status != RequestStatus::Pending {
            return Err(Error::invalid_state(
                "request",
                request.status.to_string(),
                "delete",
            ));
        }

        self.gateway.delete_request(id)?;
        info!("Deleted request {}", id);
        Ok(())
    }

    /// Fetch a request by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn load(&self, id: i64) -> Result<EmergencyRequest> {
        self.gateway
            .get_request(id)?
            .ok_or_else(|| Error::not_found("request", id.to_string()))
    }

    /// List all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub fn list(&self) -> Result<Vec<EmergencyRequest>> {
        self.gateway.list_requests()
    }
}
