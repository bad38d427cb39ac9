//! Notice board client methods

use super::{ApiRequest, ClientError, QvickClient};
use crate::types::{NewNoticeRequest, Notice};

impl QvickClient {
    /// All published notices
    pub async fn list_notices(&self) -> Result<Vec<Notice>, ClientError> {
        self.execute(&ApiRequest::get("/notice/list")).await
    }

    /// Publish a notice
    pub async fn create_notice(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), ClientError> {
        let request = ApiRequest::post("/notice").json(&NewNoticeRequest {
            title: title.into(),
            content: content.into(),
        })?;
        self.execute_empty(&request).await
    }

    /// Delete the notice with index `idx`
    pub async fn delete_notice(&self, idx: i64) -> Result<(), ClientError> {
        self.execute_empty(&ApiRequest::delete(format!("/notice/{idx}")))
            .await
    }
}
