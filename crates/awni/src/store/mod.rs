//! Persistence gateway for requests and volunteers.
//!
//! This module defines the storage abstraction the lifecycle controllers
//! are constructed with: CRUD over the two collections, the verified-
//! volunteer query used by matching, and snapshot subscriptions. Two
//! implementations are provided: [`SqliteGateway`] for durable storage and
//! [`MemoryGateway`] for tests and embedding.

pub mod memory;
pub mod migrations;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryGateway;
pub use sqlite::SqliteGateway;

use tokio::sync::broadcast;

use crate::error::Result;
use crate::request::{Assignment, EmergencyRequest, RequestStatus};
use crate::volunteer::{Volunteer, VolunteerStatus};

/// Capacity of the snapshot broadcast channels.
///
/// Lagging listeners drop intermediate snapshots and observe only newer
/// ones, which the subscription contract permits.
pub const SUBSCRIPTION_CAPACITY: usize = 16;

/// Fields of a request that may change after creation.
///
/// A patch is applied as one atomic write, so compound transitions
/// (status together with assignment) can never be observed half-applied.
/// Absent fields are left untouched; an assignment is never unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPatch {
    /// New lifecycle status.
    pub status: Option<RequestStatus>,
    /// Volunteer assignment, set together with the move to `Assigned`.
    pub assignment: Option<Assignment>,
    /// Replacement description text (pending edits only).
    pub request_text: Option<String>,
    /// Arrival estimate.
    pub eta: Option<String>,
    /// Outcome report.
    pub report: Option<String>,
}

impl RequestPatch {
    /// A patch that only moves the status.
    #[must_use]
    pub fn status(status: RequestStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// The combined status-plus-assignment patch used by `assign`.
    #[must_use]
    pub fn assign(assignment: Assignment) -> Self {
        Self {
            status: Some(RequestStatus::Assigned),
            assignment: Some(assignment),
            ..Self::default()
        }
    }

    /// Apply this patch to an in-memory copy of a request, bumping its
    /// revision.
    pub fn apply(&self, request: &mut EmergencyRequest) {
        if let Some(status) = self.status {
            request.status = status;
        }
        if let Some(assignment) = &self.assignment {
            request.assignment = Some(assignment.clone());
        }
        if let Some(text) = &self.request_text {
            request.request_text = text.clone();
        }
        if let Some(eta) = &self.eta {
            request.eta = Some(eta.clone());
        }
        if let Some(report) = &self.report {
            request.report = Some(report.clone());
        }
        request.revision += 1;
    }
}

/// Fields of a volunteer that may change after registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolunteerPatch {
    /// New verification status (admin transitions).
    pub status: Option<VolunteerStatus>,
    /// Updated profession.
    pub profession: Option<String>,
    /// Updated region.
    pub region: Option<String>,
}

impl VolunteerPatch {
    /// A patch that only moves the verification status.
    #[must_use]
    pub fn status(status: VolunteerStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Apply this patch to an in-memory copy of a volunteer.
    pub fn apply(&self, volunteer: &mut Volunteer) {
        if let Some(status) = self.status {
            volunteer.status = status;
        }
        if let Some(profession) = &self.profession {
            volunteer.profession = profession.clone();
        }
        if let Some(region) = &self.region {
            volunteer.region = region.clone();
        }
    }
}

/// Storage operations consumed by the lifecycle controllers.
///
/// Writes are keyed by opaque identifiers; reads and subscriptions deliver
/// full entity snapshots, not deltas. Collection order is creation order,
/// which the matching tie-break relies on. Unsubscribing is dropping the
/// receiver.
pub trait PersistenceGateway: Send + Sync {
    /// Persist a new request, returning its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn create_request(&self, request: &EmergencyRequest) -> Result<i64>;

    /// Fetch a request by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get_request(&self, id: i64) -> Result<Option<EmergencyRequest>>;

    /// List all requests in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn list_requests(&self) -> Result<Vec<EmergencyRequest>>;

    /// List requests currently assigned to the given volunteer.
    ///
    /// Unknown volunteer ids yield an empty list (orphaned references
    /// after volunteer deletion are tolerated).
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn requests_for_volunteer(&self, volunteer_id: &str) -> Result<Vec<EmergencyRequest>>;

    /// Apply a patch to a request as a single atomic write.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `Conflict` when
    /// `expected_revision` no longer matches the stored revision.
    fn update_request(
        &self,
        id: i64,
        expected_revision: i64,
        patch: &RequestPatch,
    ) -> Result<EmergencyRequest>;

    /// Delete a request. Returns `true` if a request was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn delete_request(&self, id: i64) -> Result<bool>;

    /// Subscribe to full request-collection snapshots.
    fn subscribe_requests(&self) -> broadcast::Receiver<Vec<EmergencyRequest>>;

    /// Persist a new volunteer.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if a volunteer with the same id or email already
    /// exists.
    fn create_volunteer(&self, volunteer: &Volunteer) -> Result<()>;

    /// Fetch a volunteer by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get_volunteer(&self, id: &str) -> Result<Option<Volunteer>>;

    /// List all volunteers in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn list_volunteers(&self) -> Result<Vec<Volunteer>>;

    /// List verified volunteers in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn verified_volunteers(&self) -> Result<Vec<Volunteer>>;

    /// Look up a volunteer by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn volunteer_by_email(&self, email: &str) -> Result<Option<Volunteer>>;

    /// Apply a patch to a volunteer as a single write.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    fn update_volunteer(&self, id: &str, patch: &VolunteerPatch) -> Result<Volunteer>;

    /// Delete a volunteer. Returns `true` if a volunteer was deleted.
    ///
    /// Does not cascade to requests referencing the volunteer.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn delete_volunteer(&self, id: &str) -> Result<bool>;

    /// Subscribe to full volunteer-collection snapshots.
    fn subscribe_volunteers(&self) -> broadcast::Receiver<Vec<Volunteer>>;
}

/// Filter a request snapshot down to one volunteer's feed.
///
/// Companion to [`PersistenceGateway::subscribe_requests`] for callers that
/// follow a single volunteer's assignments.
#[must_use]
pub fn filter_for_volunteer(
    snapshot: &[EmergencyRequest],
    volunteer_id: &str,
) -> Vec<EmergencyRequest> {
    snapshot
        .iter()
        .filter(|r| r.is_assigned_to(volunteer_id))
        .cloned()
        .collect()
}

/// Shared contract exercises run against every gateway implementation.
#[cfg(test)]
pub mod gateway_tests {
    use super::*;
    use crate::request::PriorityLevel;
    use crate::volunteer::NewVolunteer;

    /// A pending request fixture.
    #[must_use]
    pub fn sample_request() -> EmergencyRequest {
        EmergencyRequest::new(
            "family trapped after flooding".to_string(),
            "Omdurman, near bridge".to_string(),
            "0912345678".to_string(),
            PriorityLevel::High,
            "flood keywords".to_string(),
        )
    }

    /// A pending volunteer fixture with a distinct id and email.
    #[must_use]
    pub fn sample_volunteer(tag: &str, city: &str) -> Volunteer {
        Volunteer::from_registration(NewVolunteer {
            id: format!("vol-{tag}"),
            full_name: format!("Volunteer {tag}"),
            email: format!("{tag}@example.sd"),
            phone_number: "0912345678".to_string(),
            profession: "Driver".to_string(),
            city: city.to_string(),
            region: "Khartoum State".to_string(),
            gender: "-".to_string(),
            photo_id_url: None,
        })
    }

    /// CRUD and feed behavior for the request collection.
    pub fn exercise_requests(gateway: &dyn PersistenceGateway) {
        assert!(gateway.list_requests().unwrap().is_empty());
        assert!(gateway.get_request(999).unwrap().is_none());
        assert!(!gateway.delete_request(999).unwrap());

        let id1 = gateway.create_request(&sample_request()).unwrap();
        let id2 = gateway.create_request(&sample_request()).unwrap();
        assert_ne!(id1, id2);

        let stored = gateway.get_request(id1).unwrap().unwrap();
        assert_eq!(stored.id, Some(id1));
        assert_eq!(stored.status, RequestStatus::Pending);
        assert_eq!(stored.revision, 0);

        // Creation order is preserved.
        let all = gateway.list_requests().unwrap();
        assert_eq!(
            all.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![Some(id1), Some(id2)]
        );

        // Compound assign patch lands atomically and bumps the revision.
        let updated = gateway
            .update_request(
                id1,
                0,
                &RequestPatch::assign(Assignment {
                    volunteer_id: "vol-a".to_string(),
                    volunteer_name: "Volunteer A".to_string(),
                }),
            )
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Assigned);
        assert!(updated.is_assigned_to("vol-a"));
        assert_eq!(updated.revision, 1);

        let feed = gateway.requests_for_volunteer("vol-a").unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, Some(id1));
        assert!(gateway.requests_for_volunteer("nobody").unwrap().is_empty());

        assert!(gateway.delete_request(id2).unwrap());
        assert!(gateway.get_request(id2).unwrap().is_none());

        let err = gateway
            .update_request(id2, 0, &RequestPatch::status(RequestStatus::Cancelled))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    /// CRUD, uniqueness, and query behavior for the volunteer collection.
    pub fn exercise_volunteers(gateway: &dyn PersistenceGateway) {
        let first = sample_volunteer("amal", "Omdurman");
        let second = sample_volunteer("omer", "Kassala");
        gateway.create_volunteer(&first).unwrap();
        gateway.create_volunteer(&second).unwrap();

        // Duplicate email is a conflict.
        let mut duplicate = sample_volunteer("amal", "Khartoum");
        duplicate.id = "vol-other".to_string();
        assert!(gateway.create_volunteer(&duplicate).unwrap_err().is_conflict());

        let stored = gateway.get_volunteer(&first.id).unwrap().unwrap();
        assert_eq!(stored.email, "amal@example.sd");
        assert!(gateway
            .volunteer_by_email("omer@example.sd")
            .unwrap()
            .is_some());
        assert!(gateway.volunteer_by_email("nobody@example.sd").unwrap().is_none());

        // Registration order is preserved; nobody is verified yet.
        let all = gateway.list_volunteers().unwrap();
        assert_eq!(
            all.iter().map(|v| v.id.clone()).collect::<Vec<_>>(),
            vec![first.id.clone(), second.id.clone()]
        );
        assert!(gateway.verified_volunteers().unwrap().is_empty());

        let updated = gateway
            .update_volunteer(&second.id, &VolunteerPatch::status(VolunteerStatus::Verified))
            .unwrap();
        assert_eq!(updated.status, VolunteerStatus::Verified);

        let verified = gateway.verified_volunteers().unwrap();
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].id, second.id);

        let updated = gateway
            .update_volunteer(
                &first.id,
                &VolunteerPatch {
                    profession: Some("Midwife".to_string()),
                    ..VolunteerPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.profession, "Midwife");
        assert_eq!(updated.city, "Omdurman");

        assert!(gateway
            .update_volunteer("missing", &VolunteerPatch::default())
            .unwrap_err()
            .is_not_found());

        assert!(gateway.delete_volunteer(&first.id).unwrap());
        assert!(!gateway.delete_volunteer(&first.id).unwrap());
        assert!(gateway.get_volunteer(&first.id).unwrap().is_none());
    }

    /// Stale-revision updates fail with a conflict and change nothing.
    pub fn exercise_revision_guard(gateway: &dyn PersistenceGateway) {
        let id = gateway.create_request(&sample_request()).unwrap();
        gateway
            .update_request(id, 0, &RequestPatch::status(RequestStatus::Cancelled))
            .unwrap();

        // A second writer holding the old revision loses.
        let err = gateway
            .update_request(id, 0, &RequestPatch::status(RequestStatus::Assigned))
            .unwrap_err();
        assert!(err.is_conflict());

        let stored = gateway.get_request(id).unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Cancelled);
        assert_eq!(stored.revision, 1);
    }

    /// Subscribers observe a fresh snapshot after each write.
    pub fn exercise_subscriptions(gateway: &dyn PersistenceGateway) {
        let mut requests_rx = gateway.subscribe_requests();
        let mut volunteers_rx = gateway.subscribe_volunteers();

        let id = gateway.create_request(&sample_request()).unwrap();
        let snapshot = requests_rx.try_recv().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, Some(id));

        gateway
            .create_volunteer(&sample_volunteer("sara", "Kassala"))
            .unwrap();
        let snapshot = volunteers_rx.try_recv().unwrap();
        assert_eq!(snapshot.len(), 1);

        // Dropping the receiver unsubscribes; writes keep succeeding.
        drop(requests_rx);
        drop(volunteers_rx);
        assert!(gateway.delete_request(id).unwrap());
    }
}
