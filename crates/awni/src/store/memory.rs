//! In-process persistence gateway.
//!
//! Holds both collections behind a mutex, preserving insertion order the
//! same way the `SQLite` gateway does. Used as the substitutable fake in
//! tests and for embedding the core without a database file.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{Error, Result};
use crate::request::EmergencyRequest;
use crate::volunteer::Volunteer;

use super::{
    PersistenceGateway, RequestPatch, VolunteerPatch, SUBSCRIPTION_CAPACITY,
};

#[derive(Debug, Default)]
struct Inner {
    next_request_id: i64,
    requests: Vec<EmergencyRequest>,
    volunteers: Vec<Volunteer>,
}

/// Memory-backed gateway with the same contract as [`super::SqliteGateway`].
#[derive(Debug)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
    requests_tx: broadcast::Sender<Vec<EmergencyRequest>>,
    volunteers_tx: broadcast::Sender<Vec<Volunteer>>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    /// Create an empty in-memory gateway.
    #[must_use]
    pub fn new() -> Self {
        let (requests_tx, _) = broadcast::channel(SUBSCRIPTION_CAPACITY);
        let (volunteers_tx, _) = broadcast::channel(SUBSCRIPTION_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                next_request_id: 1,
                ..Inner::default()
            }),
            requests_tx,
            volunteers_tx,
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_requests(&self, inner: &Inner) {
        let _ = self.requests_tx.send(inner.requests.clone());
    }

    fn publish_volunteers(&self, inner: &Inner) {
        let _ = self.volunteers_tx.send(inner.volunteers.clone());
    }
}

impl PersistenceGateway for MemoryGateway {
    fn create_request(&self, request: &EmergencyRequest) -> Result<i64> {
        let mut inner = self.inner();
        let id = inner.next_request_id;
        inner.next_request_id += 1;

        let mut stored = request.clone();
        stored.id = Some(id);
        inner.requests.push(stored);

        debug!("Inserted request with id {}", id);
        self.publish_requests(&inner);
        Ok(id)
    }

    fn get_request(&self, id: i64) -> Result<Option<EmergencyRequest>> {
        Ok(self
            .inner()
            .requests
            .iter()
            .find(|r| r.id == Some(id))
            .cloned())
    }

    fn list_requests(&self) -> Result<Vec<EmergencyRequest>> {
        Ok(self.inner().requests.clone())
    }

    fn requests_for_volunteer(&self, volunteer_id: &str) -> Result<Vec<EmergencyRequest>> {
        Ok(self
            .inner()
            .requests
            .iter()
            .filter(|r| r.is_assigned_to(volunteer_id))
            .cloned()
            .collect())
    }

    fn update_request(
        &self,
        id: i64,
        expected_revision: i64,
        patch: &RequestPatch,
    ) -> Result<EmergencyRequest> {
        let mut inner = self.inner();
        let request = inner
            .requests
            .iter_mut()
            .find(|r| r.id == Some(id))
            .ok_or_else(|| Error::not_found("request", id.to_string()))?;

        if request.revision != expected_revision {
            return Err(Error::conflict(format!(
                "request {id} was modified concurrently (revision {} != {expected_revision})",
                request.revision
            )));
        }

        patch.apply(request);
        let updated = request.clone();

        self.publish_requests(&inner);
        Ok(updated)
    }

    fn delete_request(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner();
        let before = inner.requests.len();
        inner.requests.retain(|r| r.id != Some(id));
        let deleted = inner.requests.len() < before;
        if deleted {
            self.publish_requests(&inner);
        }
        Ok(deleted)
    }

    fn subscribe_requests(&self) -> broadcast::Receiver<Vec<EmergencyRequest>> {
        self.requests_tx.subscribe()
    }

    fn create_volunteer(&self, volunteer: &Volunteer) -> Result<()> {
        let mut inner = self.inner();
        if inner
            .volunteers
            .iter()
            .any(|v| v.id == volunteer.id || v.email == volunteer.email)
        {
            return Err(Error::conflict(
                "a volunteer with this email already exists",
            ));
        }

        inner.volunteers.push(volunteer.clone());
        debug!("Inserted volunteer {}", volunteer.id);
        self.publish_volunteers(&inner);
        Ok(())
    }

    fn get_volunteer(&self, id: &str) -> Result<Option<Volunteer>> {
        Ok(self.inner().volunteers.iter().find(|v| v.id == id).cloned())
    }

    fn list_volunteers(&self) -> Result<Vec<Volunteer>> {
        Ok(self.inner().volunteers.clone())
    }

    fn verified_volunteers(&self) -> Result<Vec<Volunteer>> {
        Ok(self
            .inner()
            .volunteers
            .iter()
            .filter(|v| v.is_verified())
            .cloned()
            .collect())
    }

    fn volunteer_by_email(&self, email: &str) -> Result<Option<Volunteer>> {
        Ok(self
            .inner()
            .volunteers
            .iter()
            .find(|v| v.email == email)
            .cloned())
    }

    fn update_volunteer(&self, id: &str, patch: &VolunteerPatch) -> Result<Volunteer> {
        let mut inner = self.inner();
        let volunteer = inner
            .volunteers
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| Error::not_found("volunteer", id))?;

        patch.apply(volunteer);
        let updated = volunteer.clone();

        self.publish_volunteers(&inner);
        Ok(updated)
    }

    fn delete_volunteer(&self, id: &str) -> Result<bool> {
        let mut inner = self.inner();
        let before = inner.volunteers.len();
        inner.volunteers.retain(|v| v.id != id);
        let deleted = inner.volunteers.len() < before;
        if deleted {
            self.publish_volunteers(&inner);
        }
        Ok(deleted)
    }

    fn subscribe_volunteers(&self) -> broadcast::Receiver<Vec<Volunteer>> {
        self.volunteers_tx.subscribe()
    }
}
