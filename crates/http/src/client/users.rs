//! Profile and favorites client methods

use super::{ClientError, ShelfClient};
use crate::types::{FavoritesResponse, ProfileResponse, ToggleFavoriteRequest};
use reqwest::Method;
use shelf_core::{MediaItem, User, UserPatch};

impl ShelfClient {
    /// Fetch the signed-in user's profile
    pub async fn me(&self) -> Result<User, ClientError> {
        let request = self.request(Method::GET, "/users/me");
        let profile: ProfileResponse = self.execute(request).await?;
        Ok(profile.into())
    }

    /// Update name/email of the signed-in user
    pub async fn update_profile(&self, patch: &UserPatch) -> Result<User, ClientError> {
        let request = self.request(Method::PUT, "/users/me").json(patch);
        let profile: ProfileResponse = self.execute(request).await?;
        Ok(profile.into())
    }

    /// Flip a favorite server-side, returning the server's favorites list
    pub async fn toggle_favorite(&self, media_id: &str) -> Result<Vec<String>, ClientError> {
        let request = self
            .request(Method::POST, "/users/favorites/toggle")
            .json(&ToggleFavoriteRequest {
                media_id: media_id.to_string(),
            });
        let response: FavoritesResponse = self.execute(request).await?;
        Ok(response.favorites)
    }

    /// Full catalog entries for the user's favorites
    pub async fn favorites(&self) -> Result<Vec<MediaItem>, ClientError> {
        let request = self.request(Method::GET, "/users/favorites");
        self.execute(request).await
    }
}
