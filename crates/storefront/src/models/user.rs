//! User records.
//!
//! Users are catalog data (product owners shown next to listings). They are
//! not login identities: authentication uses the separate credential list in
//! [`crate::services::auth`], and the two sets are never reconciled.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use bazaar_core::{Email, UserId};

use crate::db::RepositoryError;

/// A user as persisted in `users.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Stored verbatim so a legacy malformed address does not make the
    /// whole document unreadable. New values are validated.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewUser {
    /// Check required fields and normalize the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for a blank name or invalid email.
    pub fn validate(&self) -> Result<Email, RepositoryError> {
        if self.name.trim().is_empty() {
            return Err(RepositoryError::Validation("name is required".to_owned()));
        }
        parse_email(&self.email)
    }

    /// Build the stored record.
    #[must_use]
    pub fn into_user(self, id: UserId, email: Email, created_at: DateTime<Utc>) -> User {
        User {
            id,
            name: self.name.trim().to_owned(),
            email: email.into(),
            image: self.image.filter(|s| !s.is_empty()),
            created_at,
        }
    }
}

/// Partial update for a user. `id` and `createdAt` are accepted and discarded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Empty string clears the image.
    pub image: Option<String>,

    #[serde(rename = "id")]
    ignored_id: Option<IgnoredAny>,
    #[serde(rename = "createdAt")]
    ignored_created_at: Option<IgnoredAny>,
}

impl UserPatch {
    /// Validate present fields, returning the normalized email if one was given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for a blank name or invalid email.
    pub fn validate(&self) -> Result<Option<Email>, RepositoryError> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(RepositoryError::Validation("name is required".to_owned()));
        }
        self.email.as_deref().map(parse_email).transpose()
    }

    /// Apply the patch in place. `id` and `created_at` are never written.
    pub fn apply(self, user: &mut User, email: Option<Email>) {
        if let Some(name) = self.name {
            user.name = name.trim().to_owned();
        }
        if let Some(email) = email {
            user.email = email.into();
        }
        if let Some(image) = self.image {
            user.image = Some(image).filter(|s| !s.is_empty());
        }
    }
}

fn parse_email(raw: &str) -> Result<Email, RepositoryError> {
    Email::parse(raw).map_err(|e| RepositoryError::Validation(format!("invalid email: {e}")))
}
