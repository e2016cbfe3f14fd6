//! Admin screens: accounts, catalog maintenance, all loans

use super::{ClientError, ShelfClient};
use crate::types::ProfileResponse;
use reqwest::Method;
use shelf_core::{AccountUpdate, BorrowRecord, MediaDraft, MediaItem, Paginated, User, UserQuery};

impl ShelfClient {
    /// List accounts
    pub async fn list_users(&self, query: &UserQuery) -> Result<Paginated<User>, ClientError> {
        let request = self.request(Method::GET, "/users").query(query);
        self.execute(request).await
    }

    /// Change an account's role or active flag
    pub async fn update_account(
        &self,
        user_id: &str,
        update: &AccountUpdate,
    ) -> Result<User, ClientError> {
        let request = self
            .request(Method::PATCH, &format!("/users/{user_id}"))
            .json(update);
        let profile: ProfileResponse = self.execute(request).await?;
        Ok(profile.into())
    }

    /// Delete an account
    pub async fn delete_user(&self, user_id: &str) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, &format!("/users/{user_id}"));
        self.execute_empty(request).await
    }

    /// Add a catalog entry
    pub async fn create_media(&self, draft: &MediaDraft) -> Result<MediaItem, ClientError> {
        let request = self.request(Method::POST, "/media").json(draft);
        self.execute(request).await
    }

    /// Replace a catalog entry
    pub async fn update_media(&self, id: &str, draft: &MediaDraft) -> Result<MediaItem, ClientError> {
        let request = self.request(Method::PUT, &format!("/media/{id}")).json(draft);
        self.execute(request).await
    }

    /// Remove a catalog entry
    pub async fn delete_media(&self, id: &str) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, &format!("/media/{id}"));
        self.execute_empty(request).await
    }

    /// Every loan in the library
    pub async fn all_borrows(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Paginated<BorrowRecord>, ClientError> {
        let request = self
            .request(Method::GET, "/borrow")
            .query(&[("page", page.max(1)), ("limit", limit.max(1))]);
        self.execute(request).await
    }
}
