//! User repository over `users.json`.

use chrono::Utc;
use tracing::instrument;

use bazaar_core::UserId;

use super::{Record, RecordStore, RepositoryError};
use crate::models::{NewUser, User, UserPatch};

impl Record for User {
    type Id = UserId;

    const COLLECTION: &'static str = "users";
    const FILE_NAME: &'static str = "users.json";

    fn id(&self) -> UserId {
        self.id
    }
}

/// Repository for user records.
pub struct UserRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// All users in document order. Missing or corrupt document → empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` for I/O failures other than a missing file.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        self.store.list().await
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` for I/O failures.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.list().await?.into_iter().find(|u| u.id == id))
    }

    /// Create a user with the next id and the current time.
    ///
    /// Email uniqueness is not checked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for a blank name or invalid
    /// email, and storage errors if the document cannot be read or written.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create(&self, new: NewUser) -> Result<User, RepositoryError> {
        let email = new.validate()?;

        let mut users = self.store.load_document::<User>().await?;
        let id = User::next_id(&users)?;
        let user = new.into_user(id, email, Utc::now());
        users.push(user.clone());
        self.store.save_document(&users).await?;

        tracing::info!(id = %user.id, "user created");
        Ok(user)
    }

    /// Apply a patch to an existing user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this id,
    /// `RepositoryError::Validation` for invalid input, and storage errors
    /// if the document cannot be read or written.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: UserId, patch: UserPatch) -> Result<User, RepositoryError> {
        let email = patch.validate()?;

        let mut users = self.store.load_document::<User>().await?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        patch.apply(user, email);
        let updated = user.clone();
        self.store.save_document(&users).await?;

        tracing::info!(%id, "user updated");
        Ok(updated)
    }

    /// Remove a user. Products that reference it are left untouched and
    /// will show an unresolved owner.
    ///
    /// # Errors
    ///
    /// Returns storage errors if the document cannot be read or written.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut users = self.store.load_document::<User>().await?;
        let before = users.len();
        users.retain(|u| u.id != id);
        let removed = users.len() != before;
        self.store.save_document(&users).await?;

        tracing::info!(%id, removed, "user delete");
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_user(name: &str, email: &str) -> NewUser {
        serde_json::from_value(json!({ "name": name, "email": email })).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let repo = store.users();

        let ada = repo.create(new_user("Ada", "ada@example.com")).await.unwrap();
        let bob = repo.create(new_user("Bob", "bob@example.com")).await.unwrap();
        assert_eq!(ada.id, UserId::new(1));
        assert_eq!(bob.id, UserId::new(2));

        let found = repo.get_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(found, bob);
        assert!(repo.get_by_id(UserId::new(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_continue_from_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        tokio::fs::write(
            store.document_path::<User>(),
            serde_json::to_vec(&json!({
                "users": [
                    {"id": 10, "name": "Old", "email": "old@example.com",
                     "createdAt": "2023-01-01T00:00:00Z"}
                ]
            }))
            .unwrap(),
        )
        .await
        .unwrap();

        let created = store
            .users()
            .create(new_user("New", "new@example.com"))
            .await
            .unwrap();
        assert_eq!(created.id, UserId::new(11));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let repo = store.users();
        let ada = repo.create(new_user("Ada", "ada@example.com")).await.unwrap();

        let patch: UserPatch =
            serde_json::from_value(json!({"email": "ADA@lovelace.dev", "createdAt": "x"}))
                .unwrap();
        let updated = repo.update(ada.id, patch).await.unwrap();
        assert_eq!(updated.email, "ada@lovelace.dev");
        assert_eq!(updated.created_at, ada.created_at);

        assert!(repo.delete(ada.id).await.unwrap());
        assert!(matches!(
            repo.update(ada.id, UserPatch::default()).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected_before_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());

        let result = store.users().create(new_user("Eve", "eve-at-example")).await;
        assert!(matches!(result, Err(RepositoryError::Validation(_))));
        assert!(!store.document_path::<User>().exists());
    }
}
