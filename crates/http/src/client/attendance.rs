//! Attendance export client methods

use super::{ApiRequest, ClientError, QvickClient};
use crate::types::AttendanceExport;

impl QvickClient {
    /// Download the attendance spreadsheet for one day
    pub async fn export_attendance(&self, export: &AttendanceExport) -> Result<Vec<u8>, ClientError> {
        let request = export
            .query_pairs()
            .into_iter()
            .fold(ApiRequest::get("/check/export/excel"), |request, (key, value)| {
                request.query(key, value)
            });
        self.execute_bytes(&request).await
    }
}
