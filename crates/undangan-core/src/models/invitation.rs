//! Invitation domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Theme used when none is requested at registration.
pub const DEFAULT_THEME_KEY: &str = "elegant";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Unique per customer.
    pub slug: String,
    pub title: String,
    /// Denormalized, case-insensitive search key.
    pub search_name: String,
    pub event_date: Option<DateTime<Utc>>,
    pub theme_key: String,
    pub is_published: bool,
    /// Free-form document; `{}` when nothing was supplied.
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitation {
    pub customer_id: Uuid,
    pub slug: String,
    pub title: String,
    pub search_name: String,
    pub event_date: Option<DateTime<Utc>>,
    pub theme_key: String,
    pub is_published: bool,
    pub content: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateInvitation {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub search_name: Option<String>,
    /// `Some(None)` clears the date.
    pub event_date: Option<Option<DateTime<Utc>>>,
    pub theme_key: Option<String>,
    pub is_published: Option<bool>,
    pub content: Option<serde_json::Value>,
}

/// Publication state used to narrow invitation listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    Published,
    Draft,
}

impl PublishState {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

/// Criteria for listing invitations. Unset fields do not narrow the
/// result; set fields are combined with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvitationFilter {
    pub customer_id: Option<Uuid>,
    /// Case-insensitive substring of the title or the search name.
    pub query: Option<String>,
    pub state: Option<PublishState>,
    /// Inclusive lower bound on `event_date`. Undated invitations never
    /// match a date bound.
    pub event_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `event_date`.
    pub event_to: Option<DateTime<Utc>>,
}

impl InvitationFilter {
    pub fn for_customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    /// The text query, trimmed and lower-cased; `None` when blank.
    pub fn search_text(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }
}

/// An invitation listed together with its owner's display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationWithCustomer {
    pub invitation: Invitation,
    /// Empty when the owner no longer exists.
    pub customer_name: String,
    pub customer_domain: Option<String>,
}

/// `{}` for missing or null content, the value itself otherwise.
pub fn normalize_content(content: Option<serde_json::Value>) -> serde_json::Value {
    match content {
        None | Some(serde_json::Value::Null) => serde_json::Value::Object(Default::default()),
        Some(value) => value,
    }
}

/// Lower-cased, whitespace-collapsed search key.
pub fn search_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
