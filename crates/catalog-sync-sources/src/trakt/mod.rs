pub mod api;
pub mod auth;
pub mod client;

pub use auth::refresh_access_token;
pub use client::TraktClient;
