//! Assignment endpoint selection.

use leadline_types::LeadType;

/// Assignment URLs by lead kind.
///
/// Franchise leads go to their own endpoint when one is configured and fall
/// back to the default endpoint otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignTargets {
    pub default: Option<String>,
    pub prospect: Option<String>,
    pub support: Option<String>,
}

fn configured(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}

impl AssignTargets {
    /// Builds targets from raw settings. Blank URLs count as unset.
    pub fn new(
        default: Option<String>,
        prospect: Option<String>,
        support: Option<String>,
    ) -> Self {
        Self {
            default: configured(default),
            prospect: configured(prospect),
            support: configured(support),
        }
    }

    /// The URL a payload of `lead_type` is posted to, if any.
    pub fn url_for(&self, lead_type: LeadType) -> Option<&str> {
        let specific = match lead_type {
            LeadType::FranchiseProspect => self.prospect.as_deref(),
            LeadType::FranchiseSupport => self.support.as_deref(),
            LeadType::Lead | LeadType::Escalation => None,
        };
        specific.or(self.default.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.prospect.is_none() && self.support.is_none()
    }
}
