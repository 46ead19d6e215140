//! Shared types for the Leadline voice intake service.
//!
//! This crate holds the lead record filled during a call and the payload
//! shapes handed to the dispatcher. It carries no dialogue logic, so both
//! the orchestrator and the dispatch layer can depend on it without
//! depending on each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relationship of the caller to a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Owns a property and wants to list rooms.
    #[serde(rename = "propietario")]
    Owner,
    /// Looking for a room to rent.
    #[serde(rename = "inquilino")]
    Tenant,
}

impl Role {
    /// Returns the wire label used in lead payloads.
    pub fn label(self) -> &'static str {
        match self {
            Self::Owner => "propietario",
            Self::Tenant => "inquilino",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Discriminates which path through the dialogue produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadType {
    /// Regular slot-filling flow completed.
    Lead,
    /// The caller asked for a human and left a callback number.
    Escalation,
    /// Someone interested in opening a franchise.
    FranchiseProspect,
    /// An existing franchisee opening a support ticket.
    FranchiseSupport,
}

impl LeadType {
    /// Returns the canonical string label for this lead type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Escalation => "escalation",
            Self::FranchiseProspect => "franchise_prospect",
            Self::FranchiseSupport => "franchise_support",
        }
    }

    /// Whether this payload came out of the franchise sub-flow.
    pub fn is_franchise(self) -> bool {
        matches!(self, Self::FranchiseProspect | Self::FranchiseSupport)
    }
}

impl std::fmt::Display for LeadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The per-call lead record.
///
/// Fields are filled monotonically as the caller answers each step; a field
/// once set is only replaced by a correction given in the same step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub role: Option<Role>,
    pub city: Option<String>,
    pub zone: Option<String>,
    pub name: Option<String>,
    /// Nine-digit Spanish number, country prefix stripped.
    pub phone: Option<String>,
}

impl Lead {
    /// True once every slot has a value.
    pub fn is_complete(&self) -> bool {
        self.role.is_some()
            && self.city.is_some()
            && self.zone.is_some()
            && self.name.is_some()
            && self.phone.is_some()
    }
}

/// Support ticket categories for existing franchisees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportCategory {
    Payments,
    Contracts,
    Tenants,
    Platform,
    Other,
}

impl SupportCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Payments => "payments",
            Self::Contracts => "contracts",
            Self::Tenants => "tenants",
            Self::Platform => "platform",
            Self::Other => "other",
        }
    }
}

/// Franchise-specific fields attached to franchise payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FranchiseDetails {
    /// Support ticket category (support path only).
    pub category: Option<SupportCategory>,
    /// Free-text problem description (support path only).
    pub detail: Option<String>,
    /// Prior sector experience as described by the prospect.
    pub experience: Option<String>,
}

/// The unit handed to the dispatcher when a session finalizes.
///
/// Created exactly once per session and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadPayload {
    pub lead_type: LeadType,
    #[serde(flatten)]
    pub lead: Lead,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub franchise: Option<FranchiseDetails>,
}

/// A payload stamped with call metadata, as written to sinks and posted to
/// the assignment endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadEnvelope {
    pub call_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: LeadPayload,
}

impl LeadEnvelope {
    /// Stamps `payload` with the call id and the current time.
    pub fn new(call_id: impl Into<String>, payload: LeadPayload) -> Self {
        Self {
            call_id: call_id.into(),
            created_at: Utc::now(),
            payload,
        }
    }
}
