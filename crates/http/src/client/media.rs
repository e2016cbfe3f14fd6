//! Catalog browsing client methods

use super::{ClientError, ShelfClient};
use reqwest::Method;
use shelf_core::{MediaFilter, MediaItem, Paginated};

impl ShelfClient {
    /// List catalog entries matching `filter`
    pub async fn list_media(&self, filter: &MediaFilter) -> Result<Paginated<MediaItem>, ClientError> {
        let request = self.request(Method::GET, "/media").query(filter);
        self.execute(request).await
    }

    /// Get one catalog entry
    pub async fn get_media(&self, id: &str) -> Result<MediaItem, ClientError> {
        let request = self.request(Method::GET, &format!("/media/{id}"));
        self.execute(request).await
    }

    /// Distinct genres, for filter menus
    pub async fn genres(&self) -> Result<Vec<String>, ClientError> {
        let request = self.request(Method::GET, "/media/genres");
        self.execute(request).await
    }
}
