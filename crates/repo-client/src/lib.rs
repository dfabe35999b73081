//! Async HTTP client for the document repository REST API.
//!
//! Implements the transfer capability consumed by the scheduler (staging
//! upload plus finalize-by-name), the connectivity probe, and repository
//! browsing helpers used to pick a destination folder.

mod client;
mod token;
mod types;

pub use client::{RepoClient, RepoError};
pub use token::auth_token_link;
pub use types::RepoDocument;
