//! Login handshake
//!
//! The site hands out an anonymous `itchio_token` cookie together with a CSRF
//! token on the login form. Posting the form with both returns the `itchio`
//! session cookie. The credential is the pair of cookies.

use crate::config::{CrawlerConfig, SiteConfig};
use crate::consts::CSRF_INPUT_SELECTOR;
use crate::session::Credential;
use crate::{SessionError, SessionResult};
use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use reqwest::redirect::Policy;
use reqwest::Client;
use scraper::Html;
use url::Url;

const ANONYMOUS_COOKIE: &str = "itchio_token";
const SESSION_COOKIE: &str = "itchio";

/// Logs in and returns the session credential
///
/// # Arguments
///
/// * `site` - Site configuration (base URL, user agent)
/// * `crawler` - Request timeout
/// * `username` - Account name
/// * `password` - Account password
///
/// # Errors
///
/// * `SessionError::Auth` - The form, a cookie or the session was missing
/// * `SessionError::Transport` - The login page could not be reached or read
pub async fn login(
    site: &SiteConfig,
    crawler: &CrawlerConfig,
    username: &str,
    password: &str,
) -> SessionResult<Credential> {
    let login_url = Url::parse(&site.base_url)
        .and_then(|base| base.join("/login"))
        .map_err(|e| SessionError::Auth(format!("Invalid login URL: {}", e)))?;
    let transport = |e: reqwest::Error| SessionError::Transport {
        url: login_url.to_string(),
        message: e.to_string(),
    };

    // Redirects are not followed so the session cookie on the 302 is visible
    let client = Client::builder()
        .user_agent(site.user_agent.clone())
        .timeout(crawler.request_timeout())
        .redirect(Policy::none())
        .build()
        .map_err(transport)?;

    tracing::debug!("Requesting login form from {}", login_url);
    let form_response = client
        .get(login_url.clone())
        .send()
        .await
        .map_err(transport)?;

    let anonymous_token = parse_cookie_value(form_response.headers(), ANONYMOUS_COOKIE)
        .ok_or_else(|| SessionError::Auth(format!("No {} cookie issued", ANONYMOUS_COOKIE)))?;
    let body = form_response.text().await.map_err(transport)?;
    let csrf_token = extract_csrf_token(&body)
        .ok_or_else(|| SessionError::Auth("Login form has no CSRF token".to_string()))?;

    let login_response = client
        .post(login_url.clone())
        .header(COOKIE, format!("{}={}", ANONYMOUS_COOKIE, anonymous_token))
        .form(&[
            ("username", username),
            ("password", password),
            ("csrf_token", csrf_token.as_str()),
        ])
        .send()
        .await
        .map_err(transport)?;

    let session_token = parse_cookie_value(login_response.headers(), SESSION_COOKIE)
        .ok_or_else(|| SessionError::Auth("Login rejected, no session cookie issued".to_string()))?;

    tracing::info!("Logged in as {}", username);

    Ok(Credential::new(format!(
        "{}={}; {}={}",
        ANONYMOUS_COOKIE, anonymous_token, SESSION_COOKIE, session_token
    )))
}

/// Reads the CSRF token from the login form
pub fn extract_csrf_token(body: &str) -> Option<String> {
    let document = Html::parse_document(body);

    document
        .select(&CSRF_INPUT_SELECTOR)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
}

/// Finds a cookie's value among the `Set-Cookie` headers
pub fn parse_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            let pair = cookie.split(';').next()?.trim();
            let (key, value) = pair.split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}
