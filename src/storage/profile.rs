//! User profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::leaderboards::UserId;

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider athlete id
    pub id: UserId,
    /// Display name
    pub display_name: String,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// Profile creation timestamp
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a new profile with the given name.
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}
