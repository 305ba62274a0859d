//! Volunteer entity and verification vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Verification status of a registered volunteer.
///
/// Starts at `Pending`; moves only via admin action to `Verified` or
/// `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolunteerStatus {
    /// Registered, awaiting admin review.
    Pending,
    /// Approved and eligible for assignment.
    Verified,
    /// Declined by an admin; eligible for deletion.
    Rejected,
}

impl std::fmt::Display for VolunteerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Verified => write!(f, "verified"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl VolunteerStatus {
    /// Parse a stored status string, defaulting to `Pending` on unknown
    /// input with a warning.
    #[must_use]
    pub fn parse_lossy(value: &str) -> Self {
        match value {
            "pending" => Self::Pending,
            "verified" => Self::Verified,
            "rejected" => Self::Rejected,
            other => {
                warn!("Unknown volunteer status: {}, defaulting to pending", other);
                Self::Pending
            }
        }
    }
}

/// A registered, potentially verified responder eligible for assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volunteer {
    /// Identity-provider account identifier.
    pub id: String,
    /// Full display name.
    pub full_name: String,
    /// Contact email; unique across volunteers.
    pub email: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Stated profession; mutable by the volunteer.
    pub profession: String,
    /// City used by the matching engine.
    pub city: String,
    /// Wider region; mutable by the volunteer.
    pub region: String,
    /// Self-reported gender.
    pub gender: String,
    /// Optional identity-document URL. Placeholder in current scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_id_url: Option<String>,
    /// Current verification status.
    pub status: VolunteerStatus,
    /// Registration time, server-assigned.
    pub registered_at: DateTime<Utc>,
}

/// Profile fields supplied at registration.
///
/// The `id` comes from the external identity provider; everything else is
/// user input validated by the volunteer lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVolunteer {
    /// Identity-provider account identifier.
    pub id: String,
    /// Full display name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Stated profession.
    pub profession: String,
    /// City used by the matching engine.
    pub city: String,
    /// Wider region.
    pub region: String,
    /// Self-reported gender.
    pub gender: String,
    /// Optional identity-document URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_id_url: Option<String>,
}

impl NewVolunteer {
    /// Derive a stable identity-provider stand-in id from an email address.
    ///
    /// Real deployments take this from the authentication backend; the CLI
    /// and tests use a truncated BLAKE3 hash of the email instead.
    #[must_use]
    pub fn derive_id(email: &str) -> String {
        blake3::hash(email.trim().to_lowercase().as_bytes())
            .to_hex()
            .to_string()[..16]
            .to_string()
    }
}

impl Volunteer {
    /// Build a pending volunteer from registration input.
    #[must_use]
    pub fn from_registration(new: NewVolunteer) -> Self {
        Self {
            id: new.id,
            full_name: new.full_name,
            email: new.email,
            phone_number: new.phone_number,
            profession: new.profession,
            city: new.city,
            region: new.region,
            gender: new.gender,
            photo_id_url: new.photo_id_url,
            status: VolunteerStatus::Pending,
            registered_at: Utc::now(),
        }
    }

    /// Check if this volunteer is eligible for assignment.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.status == VolunteerStatus::Verified
    }
}
