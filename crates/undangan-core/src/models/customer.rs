//! Customer (tenant) domain model.
//!
//! A customer is the couple owning one or more invitations. It is
//! reachable through its `domain`, which is either unset or globally
//! unique.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    #[default]
    Pending,
    Trial,
    Paid,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Trial => "trial",
            Self::Paid => "paid",
        }
    }

    /// Only paid customers may have extra invitations created for them.
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "trial" => Ok(Self::Trial),
            "paid" => Ok(Self::Paid),
            other => Err(format!("unknown customer status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    /// `None` until a domain is claimed or assigned.
    pub domain: Option<String>,
    pub status: CustomerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// The domain, treating an empty string as unset.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub full_name: String,
    pub email: String,
    /// Already hashed; storage never sees the plaintext.
    pub password_hash: String,
    pub domain: Option<String>,
    pub status: CustomerStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCustomer {
    pub full_name: Option<String>,
    pub status: Option<CustomerStatus>,
    /// `Some(Some(d))` = set, `Some(None)` = clear, `None` = no change.
    pub domain: Option<Option<String>>,
}
