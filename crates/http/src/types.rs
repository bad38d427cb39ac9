//! Wire types of the attendance backend

use chrono::NaiveDate;
use qvick_core::Role;
use serde::{Deserialize, Serialize};

/// Envelope wrapping every backend response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

/// Sign-in request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Tokens issued by a successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_role: Role,
}

/// Refresh request; the refresh token travels in the body, never as a bearer header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Resident gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

/// Teacher registration request
///
/// The backend shares one user schema with residents, so teacher accounts
/// carry placeholder resident fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpTeacherRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub std_id: String,
    pub room: String,
    pub phone_num: String,
    pub gender: Gender,
}

impl SignUpTeacherRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            std_id: "0000".to_string(),
            room: "000".to_string(),
            phone_num: "000-0000-0000".to_string(),
            gender: Gender::Female,
        }
    }
}

/// Profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub user_role: Role,
}

/// Dormitory member with today's attendance state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub email: String,
    pub name: String,
    pub std_id: String,
    pub room: String,
    pub phone_num: String,
    pub user_role: Role,
    pub gender: Gender,
    pub checked: bool,
    #[serde(default)]
    pub checked_date: Option<String>,
}

impl Member {
    /// Residents are the members whose attendance is tracked
    pub fn is_resident(&self) -> bool {
        self.user_role == Role::User
    }
}

/// Dormitory notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub idx: i64,
    pub title: String,
    pub content: String,
    pub writer: String,
    pub created_date_time: String,
    pub modified_date_time: String,
}

/// Notice creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNoticeRequest {
    pub title: String,
    pub content: String,
}

/// Ordering of the attendance spreadsheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortCriterion {
    #[default]
    StudentId,
    Name,
    Room,
    Attendance,
}

impl SortCriterion {
    /// Value of the `sortBy` query parameter
    pub const fn as_query_value(self) -> &'static str {
        match self {
            Self::StudentId => "학번",
            Self::Name => "이름",
            Self::Room => "호실",
            Self::Attendance => "출석 여부",
        }
    }
}

/// Query of the attendance export endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceExport {
    pub date: NaiveDate,
    pub sort_by: SortCriterion,
}

impl AttendanceExport {
    pub const fn new(date: NaiveDate, sort_by: SortCriterion) -> Self {
        Self { date, sort_by }
    }

    /// Query pairs in wire order
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("date", self.date.format("%Y-%m-%d").to_string()),
            ("sortBy", self.sort_by.as_query_value().to_string()),
        ]
    }

    /// File name the dashboard suggests for the download
    pub fn default_file_name(&self) -> String {
        format!("전체_명단_{}.xlsx", self.date.format("%Y-%m-%d"))
    }
}
