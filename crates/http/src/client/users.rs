//! User directory client methods

use super::{ApiRequest, ClientError, QvickClient};
use crate::types::{Member, Profile};

impl QvickClient {
    /// Profile of the signed-in user
    pub async fn profile(&self) -> Result<Profile, ClientError> {
        self.execute(&ApiRequest::get("/user")).await
    }

    /// One page of dormitory members
    pub async fn list_members(&self, page: u32, size: u32) -> Result<Vec<Member>, ClientError> {
        let request = ApiRequest::get("/user/list")
            .query("page", page)
            .query("size", size);
        self.execute(&request).await
    }
}
