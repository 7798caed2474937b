pub mod auth;
pub mod client;
pub mod config;

pub use auth::{AccessTokenProvider, AuthError, StaticTokenProvider};
pub use client::{AppendError, AppendOutcome, RowAppender, SheetsClient};
