//! Player profile model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for a profile, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(Uuid);

impl ProfileId {
    /// Create a new unique profile ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProfileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// A player identity owning one set of match and training collections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Stable identifier, never reassigned
    pub id: ProfileId,
    /// Display name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Last successful backup import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Device the profile was created on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl Profile {
    /// Create a new profile with the given display name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProfileId::new(),
            name: name.into(),
            email: None,
            avatar: None,
            created_at: Utc::now(),
            last_sync_at: None,
            device_id: None,
        }
    }

    /// Short prefix of the identifier for listings
    #[must_use]
    pub fn short_id(&self) -> String {
        self.id.as_str().chars().take(8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_id_unique() {
        assert_ne!(ProfileId::new(), ProfileId::new());
    }

    #[test]
    fn test_profile_id_parse() {
        let id = ProfileId::new();
        let parsed: ProfileId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<ProfileId>().is_err());
    }

    #[test]
    fn test_profile_serializes_camel_case_and_skips_empty_fields() {
        let profile = Profile::new("Ana");
        let value = serde_json::to_value(&profile).unwrap();

        assert!(value.get("createdAt").is_some());
        assert!(value.get("lastSyncAt").is_none());
        assert!(value.get("email").is_none());
    }
}
