//! Volunteer lifecycle orchestration.
//!
//! Registration starts every volunteer at pending; only admin action moves
//! them to verified or rejected, and only verified volunteers are visible
//! to the matching engine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::store::{PersistenceGateway, VolunteerPatch};
use crate::validate;
use crate::volunteer::{NewVolunteer, Volunteer, VolunteerStatus};

/// Who is asking for an account deletion.
///
/// The core has no authentication of its own; callers state the acting
/// role and the controller applies the deletion policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The volunteer acting on their own record.
    Owner,
    /// An admin, allowed to delete rejected volunteers only.
    Admin,
}

/// Partial profile update; only profession and region are volunteer-mutable
/// after registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New profession, if changing.
    pub profession: Option<String>,
    /// New region, if changing.
    pub region: Option<String>,
}

/// Orchestrates registration, approval, and profile maintenance.
pub struct VolunteerController {
    gateway: Arc<dyn PersistenceGateway>,
}

impl std::fmt::Debug for VolunteerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolunteerController").finish_non_exhaustive()
    }
}

impl VolunteerController {
    /// Create a controller over the given gateway.
    #[must_use]
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Register a new volunteer with pending status.
    ///
    /// Password policy belongs to the external identity provider and is
    /// not checked here.
    ///
    /// # Errors
    ///
    /// Returns `Validation` on malformed profile fields and `Conflict`
    /// when the email is already registered.
    pub fn register(&self, new: NewVolunteer) -> Result<Volunteer> {
        validate::validate_name("full name", &new.full_name)?;
        validate::validate_email(&new.email)?;
        validate::validate_name("profession", &new.profession)?;
        validate::validate_phone(&new.phone_number)?;
        validate::validate_non_empty("city", &new.city)?;
        validate::validate_non_empty("region", &new.region)?;

        if self.gateway.volunteer_by_email(&new.email)?.is_some() {
            return Err(Error::conflict(
                "a volunteer with this email already exists",
            ));
        }

        let volunteer = Volunteer::from_registration(new);
        self.gateway.create_volunteer(&volunteer)?;

        info!(
            "Registered volunteer {} ({}) in {}",
            volunteer.full_name, volunteer.id, volunteer.city
        );
        Ok(volunteer)
    }

    /// Approve a pending volunteer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the volunteer is pending.
    pub fn approve(&self, id: &str) -> Result<Volunteer> {
        self.review(id, VolunteerStatus::Verified, "approve")
    }

    /// Reject a pending volunteer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the volunteer is pending.
    pub fn reject(&self, id: &str) -> Result<Volunteer> {
        self.review(id, VolunteerStatus::Rejected, "reject")
    }

    /// The admin review transition, defined only from pending.
    fn review(
        &self,
        id: &str,
        outcome: VolunteerStatus,
        action: &'static str,
    ) -> Result<Volunteer> {
        let volunteer = self.load(id)?;
        if volunteer.status != VolunteerStatus::Pending {
            return Err(Error::invalid_state(
                "volunteer",
                volunteer.status.to_string(),
                action,
            ));
        }

        let updated = self
            .gateway
            .update_volunteer(id, &VolunteerPatch::status(outcome))?;
        info!("Volunteer {} is now {}", id, updated.status);
        Ok(updated)
    }

    /// Apply a partial profile update, allowed in any status.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if a provided field is malformed and
    /// `NotFound` for an unknown id.
    pub fn update_profile(&self, id: &str, update: ProfileUpdate) -> Result<Volunteer> {
        if let Some(profession) = &update.profession {
            validate::validate_name("profession", profession)?;
        }
        if let Some(region) = &update.region {
            validate::validate_non_empty("region", region)?;
        }

        let patch = VolunteerPatch {
            profession: update.profession,
            region: update.region,
            ..VolunteerPatch::default()
        };
        self.gateway.update_volunteer(id, &patch)
    }

    /// Delete a volunteer account.
    ///
    /// Owners may always delete their own record; admins only a rejected
    /// one. Requests referencing the volunteer are left in place.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `InvalidState` when an
    /// admin deletes a volunteer who is not rejected.
    pub fn delete_account(&self, id: &str, actor: Actor) -> Result<()> {
        let volunteer = self.load(id)?;
        if actor == Actor::Admin && volunteer.status != VolunteerStatus::Rejected {
            return Err(Error::invalid_state(
                "volunteer",
                volunteer.status.to_string(),
                "delete",
            ));
        }

        self.gateway.delete_volunteer(id)?;
        info!("Deleted volunteer {}", id);
        Ok(())
    }

    /// Fetch a volunteer by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn load(&self, id: &str) -> Result<Volunteer> {
        self.gateway
            .get_volunteer(id)?
            .ok_or_else(|| Error::not_found("volunteer", id))
    }

    /// List all volunteers.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub fn list(&self) -> Result<Vec<Volunteer>> {
        self.gateway.list_volunteers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryGateway;

    fn controller() -> (Arc<MemoryGateway>, VolunteerController) {
        let gateway = Arc::new(MemoryGateway::new());
        let controller = VolunteerController::new(gateway.clone());
        (gateway, controller)
    }

    fn registration(tag: &str) -> NewVolunteer {
        NewVolunteer {
            id: NewVolunteer::derive_id(&format!("{tag}@example.sd")),
            full_name: format!("Volunteer {tag}"),
            email: format!("{tag}@example.sd"),
            phone_number: "0912345678".to_string(),
            profession: "Nurse".to_string(),
            city: "Omdurman".to_string(),
            region: "Khartoum State".to_string(),
            gender: "female".to_string(),
            photo_id_url: None,
        }
    }

    #[test]
    fn test_register_starts_pending() {
        let (gateway, controller) = controller();
        let volunteer = controller.register(registration("amal")).unwrap();

        assert_eq!(volunteer.status, VolunteerStatus::Pending);
        assert!(gateway.verified_volunteers().unwrap().is_empty());
    }

    #[test]
    fn test_register_validates_profile() {
        let (gateway, controller) = controller();

        let cases = [
            NewVolunteer {
                full_name: "A".to_string(),
                ..registration("a")
            },
            NewVolunteer {
                email: "not-an-email".to_string(),
                ..registration("b")
            },
            NewVolunteer {
                profession: "x".to_string(),
                ..registration("c")
            },
            NewVolunteer {
                phone_number: "123".to_string(),
                ..registration("d")
            },
            NewVolunteer {
                city: "  ".to_string(),
                ..registration("e")
            },
            NewVolunteer {
                region: String::new(),
                ..registration("f")
            },
        ];
        for case in cases {
            assert!(controller.register(case).unwrap_err().is_validation());
        }
        assert!(gateway.list_volunteers().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let (_, controller) = controller();
        controller.register(registration("amal")).unwrap();

        let mut duplicate = registration("amal");
        duplicate.id = "different-id".to_string();
        let err = controller.register(duplicate).unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_approve_and_reject_from_pending_only() {
        let (gateway, controller) = controller();
        let amal = controller.register(registration("amal")).unwrap();
        let omer = controller.register(registration("omer")).unwrap();

        let approved = controller.approve(&amal.id).unwrap();
        assert_eq!(approved.status, VolunteerStatus::Verified);

        let rejected = controller.reject(&omer.id).unwrap();
        assert_eq!(rejected.status, VolunteerStatus::Rejected);

        // Second approve fails and leaves the status verified.
        assert!(controller.approve(&amal.id).unwrap_err().is_invalid_state());
        let stored = gateway.get_volunteer(&amal.id).unwrap().unwrap();
        assert_eq!(stored.status, VolunteerStatus::Verified);

        // Cross transitions are equally undefined.
        assert!(controller.reject(&amal.id).unwrap_err().is_invalid_state());
        assert!(controller.approve(&omer.id).unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_update_profile_partial_any_status() {
        let (_, controller) = controller();
        let volunteer = controller.register(registration("amal")).unwrap();
        controller.approve(&volunteer.id).unwrap();

        let updated = controller
            .update_profile(
                &volunteer.id,
                ProfileUpdate {
                    profession: Some("Midwife".to_string()),
                    region: None,
                },
            )
            .unwrap();
        assert_eq!(updated.profession, "Midwife");
        assert_eq!(updated.region, "Khartoum State");
        assert_eq!(updated.status, VolunteerStatus::Verified);

        let err = controller
            .update_profile(
                &volunteer.id,
                ProfileUpdate {
                    profession: Some("x".to_string()),
                    region: None,
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_owner_may_always_delete() {
        let (gateway, controller) = controller();
        let volunteer = controller.register(registration("amal")).unwrap();
        controller.approve(&volunteer.id).unwrap();

        controller.delete_account(&volunteer.id, Actor::Owner).unwrap();
        assert!(gateway.get_volunteer(&volunteer.id).unwrap().is_none());
    }

    #[test]
    fn test_admin_deletes_rejected_only() {
        let (gateway, controller) = controller();
        let volunteer = controller.register(registration("amal")).unwrap();

        let err = controller
            .delete_account(&volunteer.id, Actor::Admin)
            .unwrap_err();
        assert!(err.is_invalid_state());

        controller.reject(&volunteer.id).unwrap();
        controller.delete_account(&volunteer.id, Actor::Admin).unwrap();
        assert!(gateway.get_volunteer(&volunteer.id).unwrap().is_none());
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let (_, controller) = controller();
        assert!(controller.load("missing").unwrap_err().is_not_found());
        assert!(controller.approve("missing").unwrap_err().is_not_found());
        assert!(controller
            .delete_account("missing", Actor::Owner)
            .unwrap_err()
            .is_not_found());
    }
}
