//! Account records, credential bodies, and auth payloads.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Shop administrator.
    Admin,
    /// Regular shopper.
    User,
}

/// Account profile as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identity.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Login email.
    pub email: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar file name on the backend image host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// ISO-8601 date of birth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// Postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Email/password pair for login and registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email.
    pub email: String,
    /// Plain password.
    pub password: String,
}

/// Sparse profile update; `None` fields are left untouched by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New avatar file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// New postal address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// New ISO-8601 date of birth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// New phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Current password, required when changing password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Replacement password.
    #[serde(rename = "new_password", skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

impl ProfileUpdate {
    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Password-change body.
    pub fn password_change(current: impl Into<String>, new_password: impl Into<String>) -> Self {
        Self {
            password: Some(current.into()),
            new_password: Some(new_password.into()),
            ..Self::default()
        }
    }
}

/// Tokens and profile returned by login and registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    /// Token sent in the `authorization` header.
    pub access_token: String,
    /// Access token lifetime, as reported by the backend.
    #[serde(default)]
    pub expires: serde_json::Value,
    /// Refresh token, stored but never exchanged by this crate.
    pub refresh_token: String,
    /// Refresh token lifetime, as reported by the backend.
    #[serde(default)]
    pub expires_refresh_token: serde_json::Value,
    /// Signed-in user.
    pub user: User,
}
