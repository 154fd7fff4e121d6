//! Canonical user record shared by every provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::profile::ProfileFields;

/// Provider-agnostic user profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub raw_data: Map<String, Value>,
    pub provider: String,
    pub email: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: String,
    pub description: String,
    pub user_id: String,
    pub avatar_url: String,
    pub location: String,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl User {
    /// Copy mapped profile fields onto this record
    pub fn apply_profile(&mut self, profile: ProfileFields) {
        self.user_id = profile.user_id;
        self.name = profile.name;
        self.nick_name = profile.nick_name;
        self.first_name = profile.first_name;
        self.last_name = profile.last_name;
        self.email = profile.email;
        self.description = profile.description;
        self.avatar_url = profile.avatar_url;
        self.location = profile.location;
    }
}
