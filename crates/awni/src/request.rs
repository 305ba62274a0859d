//! Emergency request entity and its lifecycle vocabulary.
//!
//! This module defines the canonical request representation: one status
//! enumeration and one priority enumeration per the data model, with
//! display text produced only at the presentation boundary. Logic never
//! branches on display strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Urgency level assigned to a request at creation.
///
/// Set once by the priority classifier and immutable afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    /// Life-threatening, needs immediate response.
    Critical,
    /// Urgent but not immediately life-threatening.
    High,
    /// Default level when urgency is unclear.
    Medium,
    /// Can wait for available capacity.
    Low,
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl PriorityLevel {
    /// Parse a stored priority string, defaulting to `Medium` on unknown
    /// input with a warning.
    #[must_use]
    pub fn parse_lossy(value: &str) -> Self {
        match value {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            other => {
                warn!("Unknown priority level: {}, defaulting to medium", other);
                Self::Medium
            }
        }
    }
}

/// Lifecycle status of an emergency request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Submitted, awaiting assignment.
    Pending,
    /// A volunteer has been assigned.
    Assigned,
    /// The assigned volunteer completed the request. Terminal.
    Resolved,
    /// Cancelled by the submitter, volunteer, or an admin. Terminal.
    Cancelled,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Assigned => write!(f, "assigned"),
            Self::Resolved => write!(f, "resolved"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl RequestStatus {
    /// Parse a stored status string, defaulting to `Pending` on unknown
    /// input with a warning.
    #[must_use]
    pub fn parse_lossy(value: &str) -> Self {
        match value {
            "pending" => Self::Pending,
            "assigned" => Self::Assigned,
            "resolved" => Self::Resolved,
            "cancelled" => Self::Cancelled,
            other => {
                warn!("Unknown request status: {}, defaulting to pending", other);
                Self::Pending
            }
        }
    }

    /// Check if this status permits no further mutation or transition.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Cancelled)
    }
}

/// The volunteer assigned to a request.
///
/// Identifier and display name are carried together so that a request can
/// never hold one without the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Reference to the assigned volunteer.
    pub volunteer_id: String,
    /// Display name of the assigned volunteer.
    pub volunteer_name: String,
}

/// A single emergency help submission tracked through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyRequest {
    /// Unique identifier (assigned by the persistence gateway).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Free-text description of the emergency. Triage source of truth.
    pub request_text: String,

    /// Free-text location. The token before the first comma is the region.
    pub location: String,

    /// Contact string for the submitter.
    pub contact_phone: String,

    /// Urgency level, set once at creation.
    pub priority: PriorityLevel,

    /// Rationale for the assigned priority, set once at creation.
    pub reason: String,

    /// Creation time, server-assigned, immutable.
    pub timestamp: DateTime<Utc>,

    /// Current lifecycle status.
    pub status: RequestStatus,

    /// Assigned volunteer, present from the move to `Assigned` onward.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Assignment>,

    /// Informational arrival estimate, assignable only while `Assigned`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,

    /// Outcome report, attachable exactly once after resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,

    /// Optimistic-concurrency counter, incremented by every update.
    #[serde(default)]
    pub revision: i64,
}

impl EmergencyRequest {
    /// Create a new pending request with the given triage outcome.
    ///
    /// Sets the timestamp to now and the revision to zero; the identifier
    /// is assigned by the gateway at persistence time.
    #[must_use]
    pub fn new(
        request_text: String,
        location: String,
        contact_phone: String,
        priority: PriorityLevel,
        reason: String,
    ) -> Self {
        Self {
            id: None,
            request_text,
            location,
            contact_phone,
            priority,
            reason,
            timestamp: Utc::now(),
            status: RequestStatus::Pending,
            assignment: None,
            eta: None,
            report: None,
            revision: 0,
        }
    }

    /// Check if this request currently has an assigned volunteer.
    #[must_use]
    pub fn is_assigned_to(&self, volunteer_id: &str) -> bool {
        self.assignment
            .as_ref()
            .is_some_and(|a| a.volunteer_id == volunteer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_display() {
        assert_eq!(PriorityLevel::Critical.to_string(), "critical");
        assert_eq!(PriorityLevel::High.to_string(), "high");
        assert_eq!(PriorityLevel::Medium.to_string(), "medium");
        assert_eq!(PriorityLevel::Low.to_string(), "low");
    }

    #[test]
    fn test_priority_parse_lossy_round_trip() {
        for level in [
            PriorityLevel::Critical,
            PriorityLevel::High,
            PriorityLevel::Medium,
            PriorityLevel::Low,
        ] {
            assert_eq!(PriorityLevel::parse_lossy(&level.to_string()), level);
        }
    }

    #[test]
    fn test_priority_parse_lossy_unknown_defaults_to_medium() {
        assert_eq!(PriorityLevel::parse_lossy("urgent!!"), PriorityLevel::Medium);
        assert_eq!(PriorityLevel::parse_lossy(""), PriorityLevel::Medium);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(RequestStatus::Pending.to_string(), "pending");
        assert_eq!(RequestStatus::Assigned.to_string(), "assigned");
        assert_eq!(RequestStatus::Resolved.to_string(), "resolved");
        assert_eq!(RequestStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_status_parse_lossy_unknown_defaults_to_pending() {
        assert_eq!(RequestStatus::parse_lossy("done"), RequestStatus::Pending);
    }

    #[test]
    fn test_status_is_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::Assigned.is_terminal());
        assert!(RequestStatus::Resolved.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_new_request_starts_pending() {
        let request = EmergencyRequest::new(
            "family trapped after flooding".to_string(),
            "Omdurman, near bridge".to_string(),
            "+249 912 000 111".to_string(),
            PriorityLevel::High,
            "flood keywords detected".to_string(),
        );

        assert!(request.id.is_none());
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.assignment.is_none());
        assert!(request.eta.is_none());
        assert!(request.report.is_none());
        assert_eq!(request.revision, 0);
    }

    #[test]
    fn test_is_assigned_to() {
        let mut request = EmergencyRequest::new(
            "medical supplies needed".to_string(),
            "Kassala".to_string(),
            "0912345678".to_string(),
            PriorityLevel::Medium,
            "default".to_string(),
        );
        assert!(!request.is_assigned_to("v1"));

        request.assignment = Some(Assignment {
            volunteer_id: "v1".to_string(),
            volunteer_name: "Amal Hassan".to_string(),
        });
        assert!(request.is_assigned_to("v1"));
        assert!(!request.is_assigned_to("v2"));
    }

    #[test]
    fn test_request_serialization_skips_absent_fields() {
        let request = EmergencyRequest::new(
            "water shortage in the camp".to_string(),
            "Port Sudan, camp 3".to_string(),
            "0912345678".to_string(),
            PriorityLevel::Low,
            "supply keywords".to_string(),
        );

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("assignment"));
        assert!(!json.contains("eta"));
        assert!(!json.contains("report"));

        let back: EmergencyRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_priority_serde_snake_case() {
        let json = serde_json::to_string(&PriorityLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let back: PriorityLevel = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(back, PriorityLevel::Low);
    }
}
