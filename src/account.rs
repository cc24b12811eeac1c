//! Caller identity handed over by the external auth collaborator
//!
//! The pipeline never authenticates anyone: requests arrive with a verified
//! account identifier and entitlement flag, carried here as an `AccountRef`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque account identifier supplied by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entitlement tier, refreshed asynchronously by the billing collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Premium,
    /// Trial ran out; no new recordings may be started.
    Expired,
}

impl Plan {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Self::Free),
            "premium" => Some(Self::Premium),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// Verified caller identity: account id plus entitlement flag.
#[derive(Debug, Clone)]
pub struct AccountRef {
    pub id: AccountId,
    pub plan: Plan,
}

impl AccountRef {
    pub fn new(id: impl Into<String>, plan: Plan) -> Self {
        Self {
            id: AccountId::new(id),
            plan,
        }
    }

    /// Whether a new recording session may be started at all.
    pub fn can_record(&self) -> bool {
        !matches!(self.plan, Plan::Expired)
    }

    /// Document export is a premium-only feature.
    pub fn can_export(&self) -> bool {
        matches!(self.plan, Plan::Premium)
    }
}
