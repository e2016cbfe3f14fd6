//! Borrowing client methods

use super::{ClientError, ShelfClient};
use crate::types::BorrowRequest;
use reqwest::Method;
use shelf_core::BorrowRecord;

impl ShelfClient {
    /// Borrow history of the signed-in user, newest first
    pub async fn my_borrows(&self) -> Result<Vec<BorrowRecord>, ClientError> {
        let request = self.request(Method::GET, "/borrow/mine");
        self.execute(request).await
    }

    /// Borrow a catalog entry
    pub async fn borrow_media(&self, media_id: &str) -> Result<BorrowRecord, ClientError> {
        let request = self.request(Method::POST, "/borrow").json(&BorrowRequest {
            media_id: media_id.to_string(),
        });
        self.execute(request).await
    }

    /// Return a borrowed entry
    pub async fn return_media(&self, borrow_id: &str) -> Result<BorrowRecord, ClientError> {
        let request = self.request(Method::PUT, &format!("/borrow/{borrow_id}/return"));
        self.execute(request).await
    }
}
