//! Favorites, toggled optimistically

use crate::auth::SessionContext;
use crate::optimistic::{Reconciled, mutate_then_reconcile};
use shelf_core::{MediaItem, UserPatch};
use shelf_http::ClientError;

pub const TOGGLE_FAILED: &str = "Could not update favorites. Please try again.";

/// Favorites of the signed-in user
#[derive(Debug, Clone)]
pub struct FavoritesService {
    session: SessionContext,
}

impl FavoritesService {
    pub const fn new(session: SessionContext) -> Self {
        Self { session }
    }

    pub fn is_favorite(&self, media_id: &str) -> bool {
        self.session
            .user()
            .is_some_and(|user| user.is_favorite(media_id))
    }

    /// Flip a favorite; on success the server's list replaces the local one
    ///
    /// Yields whether `media_id` is a favorite afterwards.
    pub async fn toggle(&self, media_id: &str) -> Reconciled<bool> {
        let outcome = mutate_then_reconcile(
            &self.session,
            TOGGLE_FAILED,
            |user| {
                user.toggle_favorite(media_id);
            },
            || self.session.client().toggle_favorite(media_id),
        )
        .await;

        outcome.map(|favorites| {
            let now_favorite = favorites.iter().any(|id| id == media_id);
            self.session.update_user(UserPatch::favorites(favorites));
            now_favorite
        })
    }

    /// Catalog entries of every favorite
    pub async fn list(&self) -> Result<Vec<MediaItem>, ClientError> {
        self.session.client().favorites().await
    }
}
