//! Qvick HTTP client
//!
//! Typed access to the dormitory attendance backend. Every authenticated
//! call goes through a pipeline that attaches the stored access token and
//! recovers from an expired token with a single silent refresh.

pub mod types;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "client")]
pub use client::{
    ApiRequest, ClientError, LoginRedirect, NoRedirect, QvickClient, QvickClientBuilder,
    RefreshPolicy,
};
