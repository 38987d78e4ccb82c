//! Authenticated access to the catalog site
//!
//! This module contains:
//! - The memoizing session client every crawl stage fetches through
//! - The login handshake that produces the session credential

mod auth;
mod client;

pub use auth::{extract_csrf_token, login, parse_cookie_value};
pub use client::{build_http_client, Credential, PageDocument, SessionClient};
